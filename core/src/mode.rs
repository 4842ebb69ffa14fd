/// The three pour semantics a board can be played under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
  /// Pouring moves a maximal same-color run off the top of the source tube.
  #[default]
  Normal,
  /// Pouring moves exactly one unit off the top of the source tube.
  NoCombo,
  /// The operative end is the bottom of the tube rather than the top.
  Queue,
}

impl GameMode {
  /// Parses an enum name (`"NORMAL"`, `"NO_COMBO"`, `"QUEUE"`), or `None` if
  /// `s` isn't one of the three names. Used by adapters that need to fall
  /// back to `Normal` on an unrecognized value.
  pub fn from_name(s: &str) -> Option<Self> {
    match s {
      "NORMAL" => Some(GameMode::Normal),
      "NO_COMBO" => Some(GameMode::NoCombo),
      "QUEUE" => Some(GameMode::Queue),
      _ => None,
    }
  }

  pub fn from_ordinal(ordinal: i64) -> Option<Self> {
    match ordinal {
      0 => Some(GameMode::Normal),
      1 => Some(GameMode::NoCombo),
      2 => Some(GameMode::Queue),
      _ => None,
    }
  }

  pub fn ordinal(&self) -> i64 {
    match self {
      GameMode::Normal => 0,
      GameMode::NoCombo => 1,
      GameMode::Queue => 2,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      GameMode::Normal => "NORMAL",
      GameMode::NoCombo => "NO_COMBO",
      GameMode::Queue => "QUEUE",
    }
  }

  /// Parses the interactive stdin prompt (`0|1|2`). Falls back to `Normal`
  /// on unparseable input, mirroring the JSON fallback above.
  pub fn from_prompt(s: &str) -> Self {
    s.trim()
      .parse::<i64>()
      .ok()
      .and_then(GameMode::from_ordinal)
      .unwrap_or_default()
  }
}
