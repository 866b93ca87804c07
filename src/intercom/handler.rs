use crate::error::{KeeperError, Result};
use crate::field::Field;
use crate::math::Vec2;

const GO_TO_BASE: &str = "Go to base";
const BALL_RIGHT_CORNER: &str = "ball at the right corner";
const BALL_LEFT_CORNER: &str = "ball at the left corner";
const WRONG_DIRECTION: &str = "you are looking in the wrong direction";
const POSITION_PREFIX: &str = "position: ";

/// What a teammate message asks the keeper to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeammateCommand {
    Relocate(Vec2),
    TeammateAt(Vec2),
    ReverseSearch,
}

/// Parses the `<int>,<int>` payload of a `position:` message.
pub fn parse_position(payload: &str) -> Result<Vec2> {
    let mut fields = payload.split(',');
    let (x, y) = match (fields.next(), fields.next(), fields.next()) {
        (Some(x), Some(y), None) => (x.trim(), y.trim()),
        _ => return Err(KeeperError::Parse(payload.to_owned())),
    };

    match (x.parse::<i64>(), y.parse::<i64>()) {
        (Ok(x), Ok(y)) => Ok(Vec2::new(x as f64, y as f64)),
        _ => Err(KeeperError::Parse(payload.to_owned())),
    }
}

/// Maps one radio message onto a command. Unknown messages are ignored,
/// malformed positions are logged and dropped.
pub fn interpret(message: &str, field: &Field) -> Option<TeammateCommand> {
    match message {
        GO_TO_BASE => Some(TeammateCommand::Relocate(field.home())),
        BALL_RIGHT_CORNER => Some(TeammateCommand::Relocate(field.right_corner_guard())),
        BALL_LEFT_CORNER => Some(TeammateCommand::Relocate(field.left_corner_guard())),
        WRONG_DIRECTION => Some(TeammateCommand::ReverseSearch),
        _ => match message.strip_prefix(POSITION_PREFIX) {
            Some(payload) => match parse_position(payload) {
                Ok(position) => Some(TeammateCommand::TeammateAt(position)),
                Err(err) => {
                    log::warn!("{}", err);
                    None
                }
            },
            None => {
                log::debug!("Ignoring unknown teammate message {:?}", message);
                None
            }
        },
    }
}
