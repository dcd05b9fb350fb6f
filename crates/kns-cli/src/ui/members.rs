//! Member list of the opened group: right panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Focus};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let group = app
    .members_group
    .as_deref()
    .and_then(|slug| app.rows.iter().find(|r| r.slug == slug))
    .map_or("Members", |r| r.name.as_str());

  let border = if app.focus == Focus::Members { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(format!(" {group} ({}) ", app.members.len()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.members.is_empty() {
    f.render_widget(
      Paragraph::new("No members besides the leader.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app
    .members
    .iter()
    .map(|p| {
      ListItem::new(Line::from(vec![
        Span::raw(p.full_name()),
        Span::styled(format!("  {}", p.role.label()), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select((app.focus == Focus::Members).then_some(app.member_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
