//! Byte-key interpolation command.

use anyhow::{Result, bail};
use groupcost_core::uniform_portion;
use serde::Serialize;

use crate::OutputFormat;
use crate::output::{self, Format};

/// Interpolation result.
#[derive(Serialize)]
struct PortionOutput {
    low: String,
    high: String,
    target: String,
    total: u64,
    portion: u64,
}

/// Run the portion command.
pub fn run(
    low: &str,
    high: &str,
    target: &str,
    total: u64,
    hex: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let decode = |text: &str| if hex { decode_hex(text) } else { Ok(text.as_bytes().to_vec()) };
    let (low_key, high_key, target_key) = (decode(low)?, decode(high)?, decode(target)?);
    let portion = uniform_portion(&low_key, &high_key, &target_key, total);

    let result = PortionOutput {
        low: low.to_string(),
        high: high.to_string(),
        target: target.to_string(),
        total,
        portion,
    };
    let items = [
        ("Low", result.low.clone()),
        ("High", result.high.clone()),
        ("Target", result.target.clone()),
        ("Total", total.to_string()),
        ("Portion", portion.to_string()),
    ];
    output::print_report(&result, &items, Format::from(format), quiet)
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.len() % 2 != 0 {
        bail!("hex key {text} has an odd number of digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| anyhow::anyhow!("invalid hex key {text}"))
        })
        .collect()
}
