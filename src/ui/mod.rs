//! Terminal output helpers shared by the commands

use anstyle::{AnsiColor, Color, Style};

/// Non-fatal warning on stderr
pub fn warn(message: &str) {
  eprintln!("⚠️  {}", message);
}

/// Informational line prefixed the way CI logs show tool output
pub fn info(message: &str) {
  println!("≫  {}", message);
}

/// Indent every non-empty line of `text` by `width` spaces
pub fn indent(text: &str, width: usize) -> String {
  let pad = " ".repeat(width);
  text
    .lines()
    .map(|line| {
      if line.is_empty() {
        String::new()
      } else {
        format!("{}{}", pad, line)
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Help colours for the CLI
pub fn styles() -> clap::builder::Styles {
  let heading = Style::new()
    .bold()
    .underline()
    .fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

  clap::builder::Styles::styled()
    .usage(heading)
    .header(heading)
    .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
    .invalid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .valid(
      Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Green))),
    )
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_indent_skips_blank_lines() {
    assert_eq!(indent("a\n\nb", 3), "   a\n\n   b");
  }
}
