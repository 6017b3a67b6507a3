// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::storage::VehicleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VehicleStore>,
}

impl AppState {
    pub fn new(store: VehicleStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
