use std::io::{self, IsTerminal, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Attributes, Color as CColor, ContentStyle, PrintStyledContent};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Padding, Paragraph, Widget};

use jdcode_core::config::BannerConfig;
use jdcode_core::{StatusRecord, Tone};

/// Borders (2) plus horizontal padding (2 + 2).
const HORIZONTAL_CHROME: u16 = 6;
/// Borders (2) plus vertical padding (1 + 1).
const VERTICAL_CHROME: u16 = 4;

fn plain() -> Style {
    Style::default().fg(Color::White)
}

fn key() -> Style {
    Style::default().fg(Color::Cyan)
}

fn heading() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn link() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED)
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Positive => Style::default().fg(Color::Green),
        Tone::Muted => Style::default().add_modifier(Modifier::DIM),
    }
}

fn bullet(label: &'static str) -> Span<'static> {
    Span::styled(format!("  • {}", label), plain())
}

/// Banner body: status lines followed by the static usage notes.
pub fn content(status: &StatusRecord, config: &BannerConfig) -> Text<'static> {
    let badge = status.notification_badge();

    let mut notification = vec![
        Span::styled(format!("{} Telegram notifications: ", badge.icon), plain()),
        Span::styled(badge.label, tone_style(badge.tone)),
    ];
    if !status.notification_missing_vars.is_empty() {
        notification.push(Span::styled(
            format!(" (missing: {})", status.notification_missing_vars.join(", ")),
            Style::default().fg(Color::Red),
        ));
    }

    let lines = vec![
        Line::styled(status.version_line(), key()),
        Line::from(notification),
        Line::default(),
        Line::from(vec![
            Span::styled(
                "Mouse mode is ENABLED",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" - click to switch panes & scroll", plain()),
        ]),
        Line::default(),
        Line::styled("Navigation:", heading()),
        Line::from(vec![
            bullet("Switch panes: "),
            Span::styled("Ctrl+b + arrow keys", key()),
            Span::styled(" OR click with mouse", plain()),
        ]),
        Line::from(vec![
            bullet("Resize panes: "),
            Span::styled("Ctrl+b + hold Ctrl + arrow keys", key()),
        ]),
        Line::styled("                  OR drag pane borders with mouse", plain()),
        Line::default(),
        Line::styled("OpenCode (top pane):", heading()),
        Line::from(bullet("AI-powered coding assistant")),
        Line::from(bullet("Type commands or ask questions")),
        Line::from(vec![
            bullet(""),
            Span::styled("Ctrl+p", key()),
            Span::styled(" to list available actions", plain()),
        ]),
        Line::from(vec![
            bullet("Copying to clipboard: "),
            Span::styled(
                "Option or fn + drag to select text, command-c to copy",
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::default(),
        Line::styled("Access:", heading()),
        Line::from(vec![
            bullet("VS Code web UI: "),
            Span::styled(status.access_url(), link()),
        ]),
        Line::default(),
        Line::styled("Resources:", heading()),
        Line::from(vec![
            bullet("Tmux cheat sheet: "),
            Span::styled(config.cheat_sheet_url.clone(), link()),
        ]),
    ];

    Text::from(lines)
}

/// Render the bordered panel into an off-screen buffer no wider than
/// `max_width`. Lines that do not fit are truncated, never wrapped.
pub fn render(status: &StatusRecord, config: &BannerConfig, max_width: u16) -> Buffer {
    let text = content(status, config);
    let title = Line::from(Span::styled(
        config.title.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
    .centered();

    let inner_width = clamp_u16(text.width()).max(clamp_u16(title.width()).saturating_add(2));
    let width = inner_width.saturating_add(HORIZONTAL_CHROME).min(max_width);
    let height = clamp_u16(text.height()).saturating_add(VERTICAL_CHROME);

    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(Color::LightBlue))
        .padding(Padding::new(2, 2, 1, 1));

    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    Paragraph::new(text).block(block).render(area, &mut buf);
    buf
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Plain text of one buffer row, trailing blanks removed.
pub fn row_text(buf: &Buffer, y: u16) -> String {
    let area = buf.area;
    let mut row = String::new();
    let mut x = area.left();
    while x < area.right() {
        let symbol = buf[(x, y)].symbol();
        row.push_str(symbol);
        x = x.saturating_add(symbol_width(symbol));
    }
    row.trim_end().to_string()
}

fn symbol_width(symbol: &str) -> u16 {
    (Span::raw(symbol).width() as u16).max(1)
}

/// Emit the buffer as lines of text, styled with ANSI sequences when
/// `color` is set. Runs of cells sharing a style are written together.
pub fn write_buffer<W: Write>(out: &mut W, buf: &Buffer, color: bool) -> io::Result<()> {
    let area = buf.area;
    for y in area.top()..area.bottom() {
        if !color {
            writeln!(out, "{}", row_text(buf, y))?;
            continue;
        }

        let mut run = String::new();
        let mut run_style = Style::default();
        let mut x = area.left();
        while x < area.right() {
            let cell = &buf[(x, y)];
            let style = cell.style();
            if style != run_style && !run.is_empty() {
                queue!(out, PrintStyledContent(content_style(run_style).apply(run.clone())))?;
                run.clear();
            }
            run_style = style;
            run.push_str(cell.symbol());
            x = x.saturating_add(symbol_width(cell.symbol()));
        }
        if !run.is_empty() {
            queue!(out, PrintStyledContent(content_style(run_style).apply(run)))?;
        }
        writeln!(out)?;
    }
    out.flush()
}

pub fn print_banner(status: &StatusRecord, config: &BannerConfig, color: bool) -> io::Result<()> {
    let width = if io::stdout().is_terminal() {
        crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80)
    } else {
        u16::MAX
    };
    let buf = render(status, config, width);
    let mut stdout = io::stdout().lock();
    write_buffer(&mut stdout, &buf, color)
}

fn content_style(style: Style) -> ContentStyle {
    let mut attributes = Attributes::default();
    if style.add_modifier.contains(Modifier::BOLD) {
        attributes.set(Attribute::Bold);
    }
    if style.add_modifier.contains(Modifier::DIM) {
        attributes.set(Attribute::Dim);
    }
    if style.add_modifier.contains(Modifier::ITALIC) {
        attributes.set(Attribute::Italic);
    }
    if style.add_modifier.contains(Modifier::UNDERLINED) {
        attributes.set(Attribute::Underlined);
    }

    ContentStyle {
        foreground_color: style.fg.and_then(crossterm_color),
        background_color: style.bg.and_then(crossterm_color),
        underline_color: None,
        attributes,
    }
}

fn crossterm_color(color: Color) -> Option<CColor> {
    let mapped = match color {
        Color::Reset => return None,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Indexed(i) => CColor::AnsiValue(i),
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
    };
    Some(mapped)
}
