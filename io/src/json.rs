use std::collections::BTreeSet;

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use tubes_core::{Color, Game, GameMode, Node, TubesError, TubesResult};

#[derive(Deserialize)]
struct NodeJson {
  #[serde(rename = "nodeType")]
  node_type: String,
  #[serde(rename = "originalPos")]
  original_pos: (u32, u32),
  color: Option<String>,
}

fn node_from_json(raw: &Value) -> TubesResult<Node> {
  let n: NodeJson = serde_json::from_value(raw.clone())
    .map_err(|e| TubesError::InvalidBoard(format!("invalid node: {e}")))?;
  let pos = n.original_pos;
  match n.node_type.as_str() {
    "?" => Ok(Node::Unknown { pos }),
    "!" => Ok(Node::UnknownRevealed { pos }),
    "_" => Ok(Node::Empty { pos }),
    "." => {
      let color_str = n
        .color
        .ok_or_else(|| TubesError::InvalidBoard("KNOWN node missing color".to_string()))?;
      Ok(Node::Known {
        pos,
        color: Color::from_hex(&color_str)?,
      })
    }
    other => Err(TubesError::InvalidBoard(format!("unknown nodeType: {other}"))),
  }
}

fn node_to_json(node: &Node) -> Value {
  let pos = node.pos();
  let (node_type, color) = match node {
    Node::Unknown { .. } => ("?", None),
    Node::UnknownRevealed { .. } => ("!", None),
    Node::Known { color, .. } => (".", Some(color.to_string())),
    Node::Empty { .. } => ("_", None),
  };
  let mut value = serde_json::json!({
    "nodeType": node_type,
    "originalPos": [pos.0, pos.1],
  });
  if let Some(color) = color {
    value["color"] = Value::String(color);
  }
  value
}

fn parse_game_mode(value: &Value) -> Option<GameMode> {
  match value {
    Value::String(s) => GameMode::from_name(s).or_else(|| s.parse::<i64>().ok().and_then(GameMode::from_ordinal)),
    Value::Number(n) => n.as_i64().and_then(GameMode::from_ordinal),
    _ => None,
  }
}

/// Parses the board JSON format from spec §6. An invalid or missing
/// `gameMode`/`mode` silently falls back to `NORMAL`, matching
/// `game_from_json`'s `except Exception: game_mode = GameMode.NORMAL`.
pub fn game_from_json(data: &Value) -> TubesResult<Game> {
  let groups_raw = data
    .get("groups")
    .and_then(Value::as_array)
    .ok_or_else(|| TubesError::InvalidBoard("missing \"groups\" array".to_string()))?;

  let mut groups = Vec::with_capacity(groups_raw.len());
  for group in groups_raw {
    let nodes_raw = group
      .as_array()
      .ok_or_else(|| TubesError::InvalidBoard("group is not an array".to_string()))?;
    groups.push(
      nodes_raw
        .iter()
        .map(node_from_json)
        .collect::<TubesResult<Vec<_>>>()?,
    );
  }

  let undo_count = data.get("undoCount").and_then(Value::as_u64).unwrap_or(5) as u32;

  let mode = data.get("gameMode").or_else(|| data.get("mode")).and_then(parse_game_mode).unwrap_or_else(|| {
    debug!("board JSON has no recognizable gameMode/mode value, defaulting to NORMAL");
    GameMode::default()
  });

  let capacity = data
    .get("groupCapacity")
    .or_else(|| data.get("rows"))
    .and_then(Value::as_u64)
    .map(|v| v as usize);

  Game::new(groups, capacity, mode, undo_count)
}

pub fn parse_board_json(text: &str) -> TubesResult<Game> {
  let data: Value =
    serde_json::from_str(text).map_err(|e| TubesError::InvalidBoard(format!("invalid JSON: {e}")))?;
  game_from_json(&data)
}

/// Serializes a board back to JSON. Besides the fields spec §6 names
/// (`groups`, `undoCount`, `gameMode`, `groupCapacity`, `cols`, `colors`),
/// this also writes `mode` and `rows` -- aliases `game_to_json` always
/// produced in the original, kept here for round-trip compatibility with
/// consumers expecting either naming convention.
pub fn game_to_json(game: &Game) -> Value {
  let groups: Vec<Value> = game
    .tubes()
    .iter()
    .map(|tube| Value::Array(tube.as_slice().iter().map(node_to_json).collect()))
    .collect();

  let known_colors: BTreeSet<Color> = game
    .tubes()
    .iter()
    .flat_map(|tube| tube.as_slice().iter())
    .filter_map(Node::color)
    .collect();

  serde_json::json!({
    "groups": groups,
    "undoCount": game.undo_count(),
    "gameMode": game.mode().name(),
    "mode": game.mode().ordinal(),
    "groupCapacity": game.capacity(),
    "rows": game.capacity(),
    "cols": game.tubes().len(),
    "colors": known_colors.len(),
  })
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  fn sample_json() -> Value {
    serde_json::json!({
      "groups": [
        [
          {"nodeType": ".", "originalPos": [0, 0], "color": "#ff0000"},
          {"nodeType": ".", "originalPos": [0, 1], "color": "#ff0000"}
        ],
        [
          {"nodeType": ".", "originalPos": [1, 0], "color": "#0000ff"},
          {"nodeType": ".", "originalPos": [1, 1], "color": "#0000ff"}
        ]
      ],
      "undoCount": 3,
      "gameMode": "NORMAL",
      "groupCapacity": 2,
    })
  }

  #[test]
  fn parses_a_fully_known_board() {
    let game = game_from_json(&sample_json()).unwrap();
    assert_eq!(game.capacity(), 2);
    assert_eq!(game.undo_count(), 3);
    assert!(game.is_winning_state());
  }

  #[rstest]
  #[case::unknown_name("NOT_A_MODE")]
  #[case::empty_string("")]
  #[case::stray_punctuation("??")]
  fn invalid_game_mode_falls_back_to_normal(#[case] raw_mode: &str) {
    let mut data = sample_json();
    data["gameMode"] = Value::String(raw_mode.to_string());
    let game = game_from_json(&data).unwrap();
    assert_eq!(game.mode(), GameMode::Normal);
  }

  #[rstest]
  #[case::by_name(Value::String("QUEUE".to_string()), GameMode::Queue)]
  #[case::by_numeric_string(Value::String("1".to_string()), GameMode::NoCombo)]
  #[case::by_number(Value::Number(2.into()), GameMode::Queue)]
  fn parse_game_mode_accepts_name_numeric_string_or_number(
    #[case] raw: Value,
    #[case] expected: GameMode,
  ) {
    assert_eq!(parse_game_mode(&raw), Some(expected));
  }

  #[test]
  fn missing_color_on_a_known_node_is_invalid_board() {
    let mut data = sample_json();
    data["groups"][0][0]
      .as_object_mut()
      .unwrap()
      .remove("color");
    assert!(matches!(
      game_from_json(&data),
      Err(TubesError::InvalidBoard(_))
    ));
  }

  #[test]
  fn round_trips_through_json() {
    let game = game_from_json(&sample_json()).unwrap();
    let out = game_to_json(&game);
    assert_eq!(out["groupCapacity"], 2);
    assert_eq!(out["rows"], 2);
    assert_eq!(out["cols"], 2);
    assert_eq!(out["colors"], 2);
    assert_eq!(out["gameMode"], "NORMAL");
  }
}
