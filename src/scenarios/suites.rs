//! Built-in Suites

use crate::error::Result;
use crate::model::{CacheMedium, ModelConfig};
use crate::units::GIB;

/// Read bit-error rates swept by [`nvram_ber_suite`]
pub const NVRAM_BIT_ERROR_RATES: [f64; 13] = [
    1.0e-5, 1.0e-6, 1.0e-7, 1.0e-8, 1.0e-9, 1.0e-10, 1.0e-11, 1.0e-12, 1.0e-13, 1.0e-14,
    1.0e-15, 1.0e-16, 1.0e-17,
];

/// Volatile and non-volatile primaries with zero, one and two NVRAM copies
pub fn default_suite() -> Result<Vec<ModelConfig>> {
    let mut models = Vec::new();
    // Captions count secondary copies while `copies` includes the primary, so
    // "no copies" is `copies = 1`. Taking 0/1/2 as `copies` would model one
    // copy fewer than each caption describes.
    for (secondaries, caption) in [(0, "no copies"), (1, "1 nv copy"), (2, "2 nv copy")] {
        for primary in [CacheMedium::Volatile, CacheMedium::NonVolatile] {
            let label = format!("{},", primary.short_label());
            let description = format!("primary: {:<4}{}", label, caption);
            models.push(
                ModelConfig::builder(description)
                    .copies(secondaries + 1)
                    .media(primary, CacheMedium::NonVolatile)
                    .build()?,
            );
        }
    }
    Ok(models)
}

/// Secondary placement in the bit-error sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Unmirrored,
    Dedicated,
    Symmetric,
}

/// How the NVRAM read bit-error rate affects each placement and copy count
pub fn nvram_ber_suite() -> Result<Vec<ModelConfig>> {
    let mut models = Vec::new();
    for ber in NVRAM_BIT_ERROR_RATES {
        for copies in 1..=3u32 {
            for primary in [CacheMedium::Volatile, CacheMedium::NonVolatile] {
                let placements: &[Placement] = if copies == 1 {
                    &[Placement::Unmirrored]
                } else {
                    &[Placement::Dedicated, Placement::Symmetric]
                };

                for &placement in placements {
                    // a volatile primary is only interesting with NVRAM copies
                    if primary.is_volatile() && (copies < 2 || placement == Placement::Symmetric) {
                        continue;
                    }

                    let label = primary.short_label();
                    let caption = match placement {
                        Placement::Symmetric => format!("symmetric: {} {:<2} cp", copies, label),
                        Placement::Dedicated => {
                            format!("prim: {:<2}   {} nv cp", label, copies - 1)
                        }
                        Placement::Unmirrored => format!("prim: {:<2}      0 cp", label),
                    };

                    let builder = ModelConfig::builder(format!("{}, {:.1e}", caption, ber))
                        .copies(copies)
                        .ber_nvm_read(ber);
                    let builder = match placement {
                        Placement::Symmetric => builder
                            .symmetric(true)
                            .cache_sizes(4.0 * GIB * f64::from(copies), 0.0)
                            .media(primary, primary),
                        Placement::Dedicated => builder
                            .cache_sizes(4.0 * GIB, 40.0 * GIB)
                            .media(primary, CacheMedium::NonVolatile),
                        Placement::Unmirrored => builder.media(primary, CacheMedium::NonVolatile),
                    };
                    models.push(builder.build()?);
                }
            }
        }
    }
    Ok(models)
}
