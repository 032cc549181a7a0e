//! Shared test fixtures

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::handlers::RequestContext;
use crate::permissions::{Permission, PermissionDenied};
use crate::repository::Model;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Widget {
    pub id: Option<u64>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CreateWidget {
    pub name: String,
}

impl Widget {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }

    pub fn stored(id: u64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
        }
    }
}

impl Model for Widget {
    type Args = CreateWidget;
    const NAME: &'static str = "widget";

    fn from_args(args: CreateWidget) -> Self {
        Self::named(&args.name)
    }

    fn primary_key(&self) -> Option<u64> {
        self.id
    }

    fn set_primary_key(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

/// Ordered record of what ran
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, entry: &str) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(entry.to_string());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

pub(crate) struct RecordingPermission {
    label: String,
    allow: bool,
    log: CallLog,
}

impl Permission for RecordingPermission {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn check(&self, _ctx: &RequestContext) -> Result<(), PermissionDenied> {
        self.log.record(&self.label);
        if self.allow {
            Ok(())
        } else {
            Err(PermissionDenied::forbidden(format!("{} rejected", self.label)))
        }
    }
}

pub(crate) fn recording_permission(
    label: &str,
    allow: bool,
    log: CallLog,
) -> Arc<dyn Permission> {
    Arc::new(RecordingPermission {
        label: label.to_string(),
        allow,
        log,
    })
}

pub(crate) fn recording(label: &'static str, allow: bool, log: CallLog) -> RecordingPermission {
    RecordingPermission {
        label: label.to_string(),
        allow,
        log,
    }
}
