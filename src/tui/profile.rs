use super::state::push_wrapped_status_kv;
use crate::model::Domain;
use crate::orchestrator::{ProfileView, NOT_PROVIDED};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

fn tags(items: Option<&[String]>) -> Line<'static> {
    match items {
        Some(items) => {
            let mut spans = vec![Span::raw("  ")];
            for item in items {
                spans.push(Span::styled(
                    format!(" {item} "),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                ));
                spans.push(Span::raw(" "));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled("  None", Style::default().fg(Color::DarkGray))),
    }
}

pub fn profile_lines(p: &ProfileView, width: u16) -> Vec<Line<'static>> {
    let mut out = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", p.avatar_initial),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                p.display_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(p.regno.clone(), Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled(p.tier.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(""),
        section("Contact"),
    ];

    for (label, value) in [
        ("Email", &p.email),
        ("Personal email", &p.personal_email),
        ("Mobile", &p.mobile),
    ] {
        if value == NOT_PROVIDED {
            out.push(Line::from(vec![
                Span::styled(format!("{label}:"), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::styled(NOT_PROVIDED, Style::default().fg(Color::DarkGray)),
            ]));
        } else {
            push_wrapped_status_kv(&mut out, label, value, width);
        }
    }

    out.push(Line::from(""));
    out.push(section("Applied Domains"));
    if p.applied_domains.is_empty() {
        out.push(tags(None));
    } else {
        out.push(tags(Some(p.applied_domains.as_slice())));
    }

    out.push(Line::from(""));
    out.push(section("Round Status"));
    for domain in Domain::ALL {
        out.push(Line::from(vec![
            Span::styled(
                format!("  {:<12}", domain.title()),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(format!("Current Level: {}", p.levels.get(domain))),
        ]));
    }

    out.push(Line::from(""));
    out.push(section("Participated Events"));
    out.push(tags(p.participated_events.as_deref()));
    out.push(Line::from(""));
    out.push(section("Volunteered Events"));
    out.push(tags(p.volunteered_events.as_deref()));
    out
}

pub fn draw_profile(area: Rect, f: &mut Frame, p: &ProfileView, scroll: u16) {
    let para = Paragraph::new(profile_lines(p, area.width))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Candidate Profile"),
        );
    f.render_widget(para, area);
}
