use crate::model::Domain;
use crate::responses::{DomainResponses, Segment, ShapedResponses};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn domain_header(d: &DomainResponses, selected: bool, loading: bool) -> Vec<Line<'static>> {
    let marker = if selected { "▶ " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(d.domain.title(), title_style),
        Span::raw("  "),
        Span::styled(
            format!("Current Level: {}", d.level),
            Style::default().fg(Color::Cyan),
        ),
    ])];

    if selected {
        let mut controls = vec![Span::raw("  ")];
        if loading {
            controls.push(Span::styled("Updating…", Style::default().fg(Color::Gray)));
        } else {
            if !d.level.is_max() {
                controls.push(Span::styled("[p]", Style::default().fg(Color::Magenta)));
                controls.push(Span::styled(
                    " Promote to Next Round  ",
                    Style::default().fg(Color::Green),
                ));
            }
            if !d.level.is_zero() {
                controls.push(Span::styled("[x]", Style::default().fg(Color::Magenta)));
                controls.push(Span::styled(
                    " Reject (Reset to 0)",
                    Style::default().fg(Color::Red),
                ));
            }
        }
        lines.push(Line::from(controls));
    }
    lines
}

fn answer_line(segments: &[Segment]) -> Line<'static> {
    let mut spans = vec![Span::raw("    ")];
    spans.extend(segments.iter().map(|s| match s {
        Segment::Text(t) => Span::raw(t.clone()),
        Segment::Link(url) => Span::styled(
            url.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
        ),
    }));
    Line::from(spans)
}

pub fn response_lines(
    responses: &ShapedResponses,
    selected: Option<Domain>,
    loading: bool,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for d in &responses.domains {
        if !out.is_empty() {
            out.push(Line::from(""));
        }
        out.extend(domain_header(d, selected == Some(d.domain), loading));

        for (i, task) in d.tasks.iter().enumerate() {
            let mut head = vec![Span::styled(
                format!("  Task {}", i + 1),
                Style::default().fg(Color::Gray),
            )];
            for tag in &task.subdomains {
                head.push(Span::raw(" "));
                head.push(Span::styled(
                    format!(" {tag} "),
                    Style::default().fg(Color::Black).bg(Color::Blue),
                ));
            }
            out.push(Line::from(head));

            if let Some(work) = task.submitted_work.as_ref() {
                out.push(Line::from(vec![
                    Span::styled("  Submitted Tasks: ", Style::default().fg(Color::Green)),
                    Span::raw(work.prompt.clone()),
                ]));
                out.push(answer_line(&work.answer));
            }

            for q in &task.questions {
                out.push(Line::from(vec![
                    Span::styled(format!("  Q{}. ", q.number), Style::default().fg(Color::Yellow)),
                    Span::raw(q.prompt.clone()),
                ]));
                out.push(Line::from(format!("    {}", q.answer)));
            }
        }
    }
    out
}

pub fn draw_responses(
    area: Rect,
    f: &mut Frame,
    responses: Option<&ShapedResponses>,
    selected: Option<Domain>,
    loading: bool,
    scroll: u16,
) {
    let lines = match responses {
        Some(r) => response_lines(r, selected, loading),
        None => vec![Line::from(Span::styled(
            "No application responses",
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Application Responses  (←/→ domain, p promote, x reject)"),
        );
    f.render_widget(para, area);
}
