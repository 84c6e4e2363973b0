pub mod action;
pub mod awards;
pub mod config;
pub mod deck;
pub mod legal;
pub mod lobby;
pub mod longest_path;
pub mod placement;
pub mod players;
pub mod resources;
pub mod session;
pub mod setup;
pub mod state;

pub use action::{ActionPayload, GameAction};
pub use awards::{AWARD_POINTS, Award, AwardRule, LARGEST_ARMY, LONGEST_ROUTE};
pub use config::{ConfigError, GameConfig};
pub use legal::legal_actions;
pub use longest_path::longest_path;
pub use placement::{Building, Buildings, PlacementError, Roads};
pub use players::{Inventory, Player};
pub use resources::{
    COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, ResourceBundle, ResourceError,
};
pub use session::{GameCode, GameCodeError, Session, SessionPatch};
pub use setup::{SetupOrder, SetupPlacement, SetupStep};
pub use state::{GameError, GameEvent, StepOutcome};
