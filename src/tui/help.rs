use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(keys: &[&'static str], pad: usize, desc: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
        }
        spans.push(Span::styled(*k, Style::default().fg(Color::Magenta)));
    }
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::raw(desc));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind(&["q", "Ctrl-C"], 2, "Quit"),
        keybind(&["/"], 11, "Edit registration number"),
        keybind(&["enter"], 7, "Search"),
        keybind(&["esc"], 9, "Stop editing"),
        keybind(&["tab"], 9, "Switch between profile and responses"),
        keybind(&["j", "k"], 7, "Scroll"),
        keybind(&["?"], 11, "Show/hide this help"),
        Line::from(""),
        Line::from("Application Responses:"),
        keybind(&["←", "→"], 7, "Choose domain"),
        keybind(&["p"], 11, "Promote to Next Round"),
        keybind(&["x"], 11, "Reject (Reset to 0)"),
        Line::from(""),
        Line::from("Candidate:"),
        keybind(&["e"], 11, "Export as JSON to the current directory"),
        keybind(&["y"], 11, "Copy submitted-work links to clipboard"),
        Line::from(""),
        Line::from(vec![
            Span::raw("Registration numbers look like "),
            Span::styled("22BCE1234", Style::default().fg(Color::Cyan)),
            Span::raw(" (YY: 21-24, B/M, two-letter dept, four digits)."),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
