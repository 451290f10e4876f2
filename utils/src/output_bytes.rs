/// Formats a byte count as a short human-readable string for log output,
/// e.g. `output_bytes(5 * 1024 * 1024 + 512 * 1024)` gives "5.5 MiB".
pub fn output_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024. && unit + 1 < UNITS.len() {
        value /= 1024.;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_bytes() {
        assert_eq!(output_bytes(0), "0 B");
        assert_eq!(output_bytes(1023), "1023 B");
        assert_eq!(output_bytes(1024), "1.0 KiB");
        assert_eq!(output_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MiB");
        assert_eq!(output_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
