use aql_cdx::DiscoveryProgress;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {prefix} {wide_bar:.cyan/blue} {pos}/{len} pages ({eta})";

const SPINNER_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {prefix} {pos} pages";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const BAR_CHARS: &str = "█▓▒░  ";

fn style(template: &str) -> ProgressStyle {
    match ProgressStyle::with_template(template) {
        Ok(style) => style.tick_chars(TICK).progress_chars(BAR_CHARS),
        Err(_) => ProgressStyle::default_spinner(),
    }
}

/// A spinner that turns into a bar once the page count is known.
pub fn page_bar(name: &str) -> ProgressBar {
    let pb = ProgressBar::no_length();
    pb.set_style(style(SPINNER_STYLE));
    pb.set_prefix(name.to_string());
    pb
}

/// Discovery progress callback driving `pb`.
pub fn tracker(pb: ProgressBar) -> impl Fn(DiscoveryProgress) + Send + Sync + 'static {
    move |progress| {
        if let Some(total) = progress.total_pages {
            if pb.length() != Some(total) {
                pb.set_length(total);
                pb.set_style(style(BAR_STYLE));
            }
        }
        pb.set_position(progress.pages_done);
    }
}
