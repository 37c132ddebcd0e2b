use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar in the crate's house style, or a hidden one when `enabled` is false.
pub(crate) fn bar(len: u64, enabled: bool, prefix: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:8} {bar:40.cyan/blue} {pos}/{len} ({eta}) | {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_prefix(prefix.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_bar_is_hidden() {
        let pb = bar(10, false, "Test");
        assert!(pb.is_hidden());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
    }
}
