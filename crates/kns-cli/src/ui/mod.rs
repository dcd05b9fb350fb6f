//! TUI rendering: orchestrates all panes.

pub mod drawer;
pub mod members;
pub mod tree;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Focus};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " kns  [/] search  [Tab] notifications  [q] quit",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let badge = if app.drawer.count > 0 {
    Span::styled(
      format!(" {} ", app.drawer.count),
      Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
    )
  } else {
    Span::raw("")
  };
  let right = Span::styled(format!(" {date} "), Style::default().fg(Color::Gray));

  let used = left.content.chars().count() + badge.content.chars().count() + right.content.len();
  let pad = usize::from(area.width).saturating_sub(used);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad)), badge, right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(area);

  tree::draw(f, cols[0], app);

  match app.focus {
    Focus::Drawer => drawer::draw(f, cols[1], app),
    Focus::Members | Focus::Tree if app.members_group.is_some() => members::draw(f, cols[1], app),
    _ => draw_empty_detail(f, cols[1]),
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect) {
  let block = Block::default()
    .title(" Members ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Span::styled(
      "Select a group and press Enter.",
      Style::default().fg(Color::DarkGray),
    )),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match app.focus {
    Focus::Tree if app.filter_active => ("SEARCH", "Type to filter  Esc cancel  Enter keep"),
    Focus::Tree if app.pending_move.is_some() => {
      ("MOVE", "↑↓/jk pick target  c child group  s sister group  Esc cancel")
    }
    Focus::Tree => ("GROUPS", "↑↓/jk navigate  / search  Enter members  r reload  q quit"),
    Focus::Members => ("MEMBERS", "↑↓/jk navigate  m move  Esc back  q quit"),
    Focus::Drawer => ("NOTIFICATIONS", "↑↓/jk navigate  Tab back  q quit"),
  };

  let status = if app.status_msg.is_empty() { hints } else { app.status_msg.as_str() };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}
