//! Group tree pane: left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Focus};

/// Render the group tree into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = app.filtered_rows();

  let title = if app.filter.is_empty() {
    format!(" Groups ({}) ", app.rows.len())
  } else {
    format!(" Groups ({}/{}) ", rows.len(), app.rows.len())
  };
  let border = if app.focus == Focus::Tree { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let source = app.pending_move.as_ref().map(|m| m.from_group.as_str());
  let items: Vec<ListItem> = rows
    .iter()
    .map(|row| {
      let name_style = if source == Some(row.slug.as_str()) {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
      } else if row.depth == 0 {
        Style::default().add_modifier(Modifier::BOLD)
      } else {
        Style::default()
      };
      let noun = if row.member_count == 1 { "member" } else { "members" };
      ListItem::new(Line::from(vec![
        Span::raw("  ".repeat(row.depth)),
        Span::styled(row.name.clone(), name_style),
        Span::styled(
          format!("  {} · {} {noun}", row.leader_name, row.member_count),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let cursor = if app.filter_active { "_" } else { "" };
    f.render_widget(
      Paragraph::new(format!("/{}{cursor}", app.filter)).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select((!rows.is_empty()).then_some(app.tree_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
