//! The console → streamer command set.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Echo,
    ListVideos,
    StartVideo,
    StopVideo,
    FlipRegion,
    GetError,
    ConnectNet,
    MarchTest,
}

impl Command {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Command::Echo,
            0x01 => Command::ListVideos,
            0x02 => Command::StartVideo,
            0x03 => Command::StopVideo,
            0x04 => Command::FlipRegion,
            0x05 => Command::GetError,
            0x06 => Command::ConnectNet,
            0x07 => Command::MarchTest,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        match self {
            Command::Echo => 0x00,
            Command::ListVideos => 0x01,
            Command::StartVideo => 0x02,
            Command::StopVideo => 0x03,
            Command::FlipRegion => 0x04,
            Command::GetError => 0x05,
            Command::ConnectNet => 0x06,
            Command::MarchTest => 0x07,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Echo => "ECHO",
            Command::ListVideos => "LIST_VIDEOS",
            Command::StartVideo => "START_VIDEO",
            Command::StopVideo => "STOP_VIDEO",
            Command::FlipRegion => "FLIP_REGION",
            Command::GetError => "GET_ERROR",
            Command::ConnectNet => "CONNECT_NET",
            Command::MarchTest => "MARCH_TEST",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_code() {
        for code in 0x00..=0x07u8 {
            let command = Command::from_code(code).expect("known code");
            assert_eq!(command.code(), code);
        }
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!(Command::from_code(0x08), None);
        assert_eq!(Command::from_code(0xFF), None);
    }
}
