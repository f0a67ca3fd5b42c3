#![forbid(unsafe_code)]

//! Drag payload model: what is being dragged and where it came from.
//!
//! A [`DragPayload`] is constructed exactly once at pointer-down and is
//! immutable for the lifetime of the gesture. Entity identity is fixed here,
//! not at commit time, which is what makes retried commits idempotent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a dragged thing. Determines classifier behavior.
///
/// `File`, `Text`, and `Url` cover drags that originate outside the
/// application (native transfer slots); the rest are board entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragRole {
    Panel,
    Container,
    Instance,
    File,
    Text,
    Url,
}

impl DragRole {
    /// Whether the payload came from outside the application.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::File | Self::Text | Self::Url)
    }
}

/// Stable identity of a board entity (panel, container, or instance).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Opaque identifier of one browser tab's engine instance.
///
/// Compared on drop to detect cross-window transfers: a payload whose
/// session differs from the receiving window's own id can only materialize
/// as a new entity, never move (the origin window keeps its copy).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ancestry keys locating an entity (or drop zone) inside the board tree.
///
/// Both fields are optional: a panel has neither, a container has only a
/// panel, an instance has both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ancestry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<EntityId>,
}

impl Ancestry {
    /// Ancestry with no enclosing scope (a top-level panel).
    #[must_use]
    pub const fn root() -> Self {
        Self {
            panel_id: None,
            container_id: None,
        }
    }

    /// Ancestry inside a panel.
    #[must_use]
    pub fn in_panel(panel_id: EntityId) -> Self {
        Self {
            panel_id: Some(panel_id),
            container_id: None,
        }
    }

    /// Ancestry inside a container (which is inside a panel).
    #[must_use]
    pub fn in_container(panel_id: EntityId, container_id: EntityId) -> Self {
        Self {
            panel_id: Some(panel_id),
            container_id: Some(container_id),
        }
    }

    /// Whether `self` and `other` name the same panel.
    #[must_use]
    pub fn same_panel(&self, other: &Ancestry) -> bool {
        self.panel_id.is_some() && self.panel_id == other.panel_id
    }

    /// Whether `self` and `other` name the same container.
    #[must_use]
    pub fn same_container(&self, other: &Ancestry) -> bool {
        self.container_id.is_some() && self.container_id == other.container_id
    }
}

/// Entity snapshot carried by the payload so the host can render a drag
/// preview without re-fetching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PayloadSnapshot {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl PayloadSnapshot {
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// The dragged thing: role, identity, origin, preview snapshot, and the
/// session it was picked up in.
///
/// Immutable for the lifetime of one drag gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub role: DragRole,
    pub id: EntityId,
    pub origin: Ancestry,
    pub snapshot: PayloadSnapshot,
    pub source_session: SessionId,
}

impl DragPayload {
    /// Payload for dragging a panel by its header.
    #[must_use]
    pub fn panel(id: EntityId, snapshot: PayloadSnapshot, session: SessionId) -> Self {
        Self {
            role: DragRole::Panel,
            id,
            origin: Ancestry::root(),
            snapshot,
            source_session: session,
        }
    }

    /// Payload for dragging a container within or between panels.
    #[must_use]
    pub fn container(
        id: EntityId,
        panel_id: EntityId,
        snapshot: PayloadSnapshot,
        session: SessionId,
    ) -> Self {
        Self {
            role: DragRole::Container,
            id,
            origin: Ancestry::in_panel(panel_id),
            snapshot,
            source_session: session,
        }
    }

    /// Payload for dragging an instance item out of a container.
    #[must_use]
    pub fn instance(
        id: EntityId,
        panel_id: EntityId,
        container_id: EntityId,
        snapshot: PayloadSnapshot,
        session: SessionId,
    ) -> Self {
        Self {
            role: DragRole::Instance,
            id,
            origin: Ancestry::in_container(panel_id, container_id),
            snapshot,
            source_session: session,
        }
    }

    /// Payload synthesized from a native (outside-the-app) drag.
    ///
    /// The id is minted by the host at payload construction so that a
    /// retried commit reuses it instead of creating a second entity.
    #[must_use]
    pub fn external(role: DragRole, id: EntityId, label: impl Into<String>, session: SessionId) -> Self {
        debug_assert!(role.is_external(), "external payload requires an external role");
        Self {
            role,
            id,
            origin: Ancestry::root(),
            snapshot: PayloadSnapshot::labeled(label),
            source_session: session,
        }
    }
}
