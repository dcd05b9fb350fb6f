//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use kns_core::{
  hierarchy::MoveKind,
  notification::Notification,
  profile::Profile,
  tree::{DescendantRow, GroupNode},
};

use crate::client::{ApiClient, Drawer};

// ─── Focus ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  /// The group tree in the left pane.
  Tree,
  /// The member list of the opened group.
  Members,
  /// The notification drawer.
  Drawer,
}

/// A member picked for a move; the target is chosen in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
  pub profile_slug: String,
  pub profile_name: String,
  pub from_group:   String,
}

/// The root itself at depth 0, then every descendant in pre-order.
pub fn tree_rows(root: &GroupNode) -> Vec<DescendantRow> {
  let mut rows = Vec::with_capacity(root.descendant_count + 1);
  rows.push(DescendantRow {
    depth:        0,
    name:         root.name.clone(),
    slug:         root.slug.clone(),
    leader_name:  root.leader_name.clone(),
    member_count: root.member_count,
  });
  rows.extend(root.flatten());
  rows
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub focus: Focus,

  /// Slug of the group whose tree is shown.
  pub root_slug: String,

  /// The loaded tree, flattened for display.
  pub rows: Vec<DescendantRow>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  pub filter_active: bool,

  /// Cursor position within the *filtered* tree rows.
  pub tree_cursor: usize,

  /// Slug of the group whose members are listed.
  pub members_group: Option<String>,

  pub members: Vec<Profile>,

  pub member_cursor: usize,

  pub drawer: Drawer,

  pub drawer_cursor: usize,

  pub pending_move: Option<PendingMove>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient, root_slug: String) -> Self {
    Self {
      focus: Focus::Tree,
      root_slug,
      rows: Vec::new(),
      filter: String::new(),
      filter_active: false,
      tree_cursor: 0,
      members_group: None,
      members: Vec::new(),
      member_cursor: 0,
      drawer: Drawer::default(),
      drawer_cursor: 0,
      pending_move: None,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the tree under `self.root_slug`.
  pub async fn load_tree(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading groups…".into();
    match self.client.tree(&self.root_slug).await {
      Ok(root) => {
        self.rows = tree_rows(&root);
        self.tree_cursor = self.tree_cursor.min(self.rows.len().saturating_sub(1));
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Fetch the acting profile's drawer. Anonymous sessions keep it empty.
  pub async fn load_drawer(&mut self) {
    if !self.client.has_profile() {
      return;
    }
    match self.client.drawer().await {
      Ok(drawer) => {
        self.drawer = drawer;
        self.drawer_cursor = self.drawer_cursor.min(self.drawer.count.saturating_sub(1));
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  async fn load_members(&mut self, slug: String) {
    match self.client.members(&slug).await {
      Ok(members) => {
        self.members = members;
        self.member_cursor = 0;
        self.members_group = Some(slug);
        self.focus = Focus::Members;
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  /// Tree rows matching the current filter query.
  pub fn filtered_rows(&self) -> Vec<&DescendantRow> {
    if self.filter.is_empty() {
      return self.rows.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .rows
      .iter()
      .filter(|r| {
        matcher.fuzzy_match(&r.name, &self.filter).is_some()
          || matcher.fuzzy_match(&r.leader_name, &self.filter).is_some()
      })
      .collect()
  }

  pub fn cursor_row(&self) -> Option<&DescendantRow> {
    self.filtered_rows().get(self.tree_cursor).copied()
  }

  /// Drawer items in display order, across all sections.
  pub fn drawer_items(&self) -> Vec<&Notification> {
    self.drawer.sections.iter().flat_map(|s| &s.items).collect()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }

    match self.focus {
      Focus::Tree => self.handle_tree_key(key).await,
      Focus::Members => Ok(self.handle_members_key(key)),
      Focus::Drawer => Ok(self.handle_drawer_key(key)),
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
      }
      KeyCode::Enter => self.filter_active = false,
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => return,
    }
    self.tree_cursor = 0;
  }

  async fn handle_tree_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.tree_cursor + 1 < self.filtered_rows().len() {
          self.tree_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.tree_cursor = self.tree_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(slug) = self.cursor_row().map(|r| r.slug.clone()) {
          self.load_members(slug).await;
        }
      }

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.tree_cursor = 0;
      }

      KeyCode::Tab => self.focus = Focus::Drawer,

      KeyCode::Char('r') => {
        self.load_tree().await?;
        self.load_drawer().await;
      }

      KeyCode::Char('c') if self.pending_move.is_some() => {
        self.submit_move(MoveKind::ChildGroup).await?;
      }
      KeyCode::Char('s') if self.pending_move.is_some() => {
        self.submit_move(MoveKind::SisterGroup).await?;
      }
      KeyCode::Esc if self.pending_move.is_some() => {
        self.pending_move = None;
        self.status_msg = "Move cancelled".into();
      }

      _ => {}
    }
    Ok(true)
  }

  fn handle_members_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.focus = Focus::Tree,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.member_cursor + 1 < self.members.len() {
          self.member_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.member_cursor = self.member_cursor.saturating_sub(1);
      }

      KeyCode::Char('m') => {
        let picked = self.members.get(self.member_cursor).zip(self.members_group.as_ref());
        if let Some((profile, group)) = picked {
          self.status_msg = format!(
            "Moving {}: pick a group, then c (child) or s (sister). Esc cancels.",
            profile.full_name()
          );
          self.pending_move = Some(PendingMove {
            profile_slug: profile.slug.clone(),
            profile_name: profile.full_name(),
            from_group:   group.clone(),
          });
          self.focus = Focus::Tree;
        }
      }

      _ => {}
    }
    true
  }

  fn handle_drawer_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab | KeyCode::Esc => self.focus = Focus::Tree,
      KeyCode::Down | KeyCode::Char('j') => {
        if self.drawer_cursor + 1 < self.drawer_items().len() {
          self.drawer_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.drawer_cursor = self.drawer_cursor.saturating_sub(1);
      }
      _ => {}
    }
    true
  }

  /// Send the pending move with the tree cursor as target. API refusals are
  /// reported in the status bar.
  async fn submit_move(&mut self, kind: MoveKind) -> anyhow::Result<()> {
    let Some(target) = self.cursor_row().map(|r| (r.slug.clone(), r.name.clone())) else {
      return Ok(());
    };
    let Some(pending) = self.pending_move.take() else {
      return Ok(());
    };

    match self
      .client
      .move_member(kind, &pending.from_group, &pending.profile_slug, &target.0)
      .await
    {
      Ok(()) => {
        self.status_msg = format!("Moved {} to {}", pending.profile_name, target.1);
        self.members.clear();
        self.members_group = None;
        self.load_tree().await?;
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
    Ok(())
  }
}
