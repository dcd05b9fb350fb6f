//! Notification drawer: right panel, bucketed by day.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use kns_core::notification::NotificationKind;

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(format!(" Notifications ({}) ", app.drawer.count))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.drawer.count == 0 {
    f.render_widget(
      Paragraph::new("Nothing waiting for you.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  // Section headers are list rows too, so the selected row is offset by the
  // headers above the cursor item.
  let mut items = Vec::new();
  let mut selected = None;
  let mut index = 0;
  for section in app.drawer.sections.iter().filter(|s| !s.items.is_empty()) {
    items.push(ListItem::new(Span::styled(
      section.label.clone(),
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    for item in &section.items {
      if index == app.drawer_cursor {
        selected = Some(items.len());
      }
      index += 1;
      let tag = match item.kind {
        NotificationKind::ConsentForm => "consent",
        NotificationKind::LeaderApproval => "approval",
      };
      items.push(ListItem::new(Line::from(vec![
        Span::styled(format!("  [{tag}] "), Style::default().fg(Color::DarkGray)),
        Span::raw(item.title.clone()),
        Span::styled(
          format!("  {}", item.created_at.format("%H:%M %d %b")),
          Style::default().fg(Color::DarkGray),
        ),
      ])));
    }
  }

  let mut state = ListState::default();
  state.select(selected);

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
