use serde::{Deserialize, Serialize};

/// Identifier of a room, unique for the lifetime of a relay process.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
pub enum RoomStatus {
    /// Fewer than two players; joinable.
    #[display("waiting")]
    Waiting,
    /// Two players in a running match.
    #[display("playing")]
    Playing,
    /// Match ended; resets to waiting after a cooldown.
    #[display("finished")]
    Finished,
}

/// One room's entry in a `roomList` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub is_full: bool,
    pub status: RoomStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_summary_uses_camel_case_keys() {
        let summary = RoomSummary {
            id: RoomId(3),
            name: "alpha".to_owned(),
            player_count: 1,
            is_full: false,
            status: RoomStatus::Waiting,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "name": "alpha",
                "playerCount": 1,
                "isFull": false,
                "status": "waiting",
            })
        );
    }
}
