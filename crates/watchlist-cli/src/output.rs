use clap::ValueEnum;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watchlist_models::{WatchlistItem, WatchlistKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy)]
enum Notice {
    Success,
    Info,
    Warning,
}

impl Notice {
    fn label(self) -> &'static str {
        match self {
            Notice::Success => "success",
            Notice::Info => "info",
            Notice::Warning => "warning",
        }
    }
}

/// Writes command results to stdout as text for people or JSON for scripts
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Success, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.notice(Notice::Warning, msg.as_ref());
    }

    /// Print the whole watchlist: a table for people, the stored item array for scripts
    pub fn watchlist(&self, items: &[WatchlistItem]) {
        match self.format {
            OutputFormat::Human => {
                if self.quiet {
                    return;
                }
                if items.is_empty() {
                    self.info("Your watchlist is empty");
                    return;
                }
                println!("{}", items_table(items));
                self.info(format!("{} item(s)", items.len()));
            }
            OutputFormat::Json | OutputFormat::JsonPretty => match serde_json::to_value(items) {
                Ok(value) => self.json(&value),
                Err(e) => self.warn(format!("Failed to serialize watchlist: {}", e)),
            },
        }
    }

    /// Report whether `key` is bookmarked
    pub fn membership(&self, key: WatchlistKey, present: bool) {
        match self.format {
            OutputFormat::Human => {
                if present {
                    self.success(format!("{} is in your watchlist", key));
                } else {
                    self.info(format!("{} is not in your watchlist", key));
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.json(&json!({
                    "key": key.to_string(),
                    "in_watchlist": present
                }));
            }
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }

        self.print_json(data);
    }

    fn notice(&self, kind: Notice, msg: &str) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => match kind {
                Notice::Success => println!("{} {}", "✓".green(), msg),
                Notice::Warning => println!("{} {}", "⚠".yellow(), msg),
                Notice::Info => println!("{}", msg),
            },
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({
                    "type": kind.label(),
                    "message": msg
                }));
            }
        }
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => {
                println!("{}", data);
            }
        }
    }
}

fn items_table(items: &[WatchlistItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Key").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Poster").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    for item in items {
        let title = if item.title.is_empty() { "(untitled)" } else { item.title.as_str() };
        table.add_row(vec![
            Cell::new(item.key().to_string()).fg(comfy_table::Color::Cyan),
            Cell::new(title),
            Cell::new(item.poster_path.as_deref().unwrap_or("-")),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchlist_models::MediaType;

    #[test]
    fn test_items_table_lists_every_item() {
        let items = vec![
            WatchlistItem::new(1, MediaType::Movie, "A").with_poster_path("/a.jpg"),
            WatchlistItem::new(2, MediaType::Tv, ""),
        ];
        let rendered = items_table(&items).to_string();
        assert!(rendered.contains("movie:1"));
        assert!(rendered.contains("/a.jpg"));
        assert!(rendered.contains("tv:2"));
        assert!(rendered.contains("(untitled)"));
    }
}
