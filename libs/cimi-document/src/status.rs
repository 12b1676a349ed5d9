// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Backend to CIMI state vocabularies
//!
//! Every backend status string maps to a CIMI state; anything unrecognized
//! reports `ERROR` rather than leaking backend vocabulary to clients.

/// CIMI machine state for a compute server status.
pub fn machine_state(backend_status: &str) -> &'static str {
    match backend_status {
        "ACTIVE" => "STARTED",
        "BUILDING" => "CREATING",
        "PAUSED" => "PAUSED",
        "SUSPENDED" => "SUSPENDED",
        "SHUTOFF" => "STOPPED",
        "REBOOT" | "HARD_REBOOT" => "STARTING",
        "DELETED" => "DELETING",
        _ => "ERROR",
    }
}

/// CIMI machine image state for an image service status.
pub fn image_state(backend_status: &str) -> &'static str {
    match backend_status {
        "active" => "AVAILABLE",
        "queued" | "saving" => "CREATING",
        "deleted" | "pending_delete" => "DELETING",
        _ => "ERROR",
    }
}

/// CIMI volume state for a volume service status.
pub fn volume_state(backend_status: &str) -> &'static str {
    match backend_status {
        "creating" => "CREATING",
        "available" => "AVAILABLE",
        "deleting" => "DELETING",
        _ => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("ACTIVE", "STARTED")]
    #[test_case("BUILDING", "CREATING")]
    #[test_case("PAUSED", "PAUSED")]
    #[test_case("SUSPENDED", "SUSPENDED")]
    #[test_case("SHUTOFF", "STOPPED")]
    #[test_case("REBOOT", "STARTING")]
    #[test_case("HARD_REBOOT", "STARTING")]
    #[test_case("DELETED", "DELETING")]
    #[test_case("ERROR", "ERROR")]
    #[test_case("MIGRATING", "ERROR" ; "unknown server status reports error")]
    fn machine_states(backend: &str, expected: &str) {
        assert_eq!(machine_state(backend), expected);
    }

    #[test_case("active", "AVAILABLE")]
    #[test_case("queued", "CREATING")]
    #[test_case("saving", "CREATING")]
    #[test_case("deleted", "DELETING")]
    #[test_case("pending_delete", "DELETING")]
    #[test_case("killed", "ERROR")]
    #[test_case("Active", "ERROR" ; "image statuses are case sensitive")]
    fn image_states(backend: &str, expected: &str) {
        assert_eq!(image_state(backend), expected);
    }

    #[test_case("creating", "CREATING")]
    #[test_case("available", "AVAILABLE")]
    #[test_case("deleting", "DELETING")]
    #[test_case("error_deleting", "ERROR" ; "unknown volume status reports error")]
    fn volume_states(backend: &str, expected: &str) {
        assert_eq!(volume_state(backend), expected);
    }
}
