//! Game-client capability surface.
//!
//! Storyline handlers never reach the client directly; they receive a
//! [`GameClient`] on every phase tick, read fresh snapshots from it, and
//! issue at most one fire-and-forget [`ClientCommand`] per tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::window::ResourceWindow;

macro_rules! game_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

game_id!(
    /// Inventory type identifier (what an item is).
    TypeId(i32)
);
game_id!(
    /// Inventory group identifier (the category a type belongs to).
    GroupId(i32)
);
game_id!(
    /// Station identifier.
    StationId(i64)
);
game_id!(
    /// Mission agent identifier.
    AgentId(i64)
);
game_id!(
    /// Identifier of a concrete item stack in a hangar.
    ItemId(i64)
);
game_id!(
    /// Market order identifier.
    OrderId(i64)
);

/// How many units a hangar entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemQuantity {
    /// A single assembled unit, such as a ship ready to board.
    Assembled,
    /// A packaged stack of the given size.
    Stack(u64),
}

impl ItemQuantity {
    /// Units represented by this entry. An assembled item counts as one.
    #[must_use]
    pub const fn units(self) -> u64 {
        match self {
            Self::Assembled => 1,
            Self::Stack(units) => units,
        }
    }
}

/// One entry listed by a hangar window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HangarItem {
    /// The item stack identifier.
    pub item_id: ItemId,
    /// What the item is.
    pub type_id: TypeId,
    /// The category of the item.
    pub group_id: GroupId,
    /// Quantity marker.
    pub quantity: ItemQuantity,
}

/// Snapshot of a hangar window (ship hangar or item hangar).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HangarWindow {
    /// Whether the window has finished loading its contents.
    pub ready: bool,
    /// Listed contents. Only meaningful once `ready` is set.
    pub items: Vec<HangarItem>,
}

impl HangarWindow {
    /// Total units of `type_id` across all listed stacks.
    #[must_use]
    pub fn quantity_of(&self, type_id: TypeId) -> u64 {
        self.items
            .iter()
            .filter(|item| item.type_id == type_id)
            .map(|item| item.quantity.units())
            .fold(0, u64::saturating_add)
    }

    /// The first assembled item of the given group, if any.
    #[must_use]
    pub fn assembled_in_group(&self, group_id: GroupId) -> Option<&HangarItem> {
        self.items
            .iter()
            .find(|item| item.quantity == ItemQuantity::Assembled && item.group_id == group_id)
    }
}

impl ResourceWindow for HangarWindow {
    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// A sell order listed in the market window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellOrder {
    /// The order identifier, used to buy from it.
    pub order_id: OrderId,
    /// Where the goods are located.
    pub station_id: StationId,
    /// Price per unit in ISK.
    pub price: f64,
    /// Units still available on the order.
    pub volume_remaining: u64,
}

/// Snapshot of the market window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketWindow {
    /// Whether the window has finished loading.
    pub ready: bool,
    /// The type whose orders are currently displayed.
    pub detail_type_id: Option<TypeId>,
    /// Sell orders for `detail_type_id`.
    pub sell_orders: Vec<SellOrder>,
}

impl ResourceWindow for MarketWindow {
    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Where a buy order may be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRange {
    /// Only at the pilot's current station.
    Station,
    /// Anywhere in the current solar system.
    SolarSystem,
    /// Anywhere in the current region.
    Region,
}

/// Fire-and-forget commands a handler can issue against the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Open the ship hangar window.
    OpenShipHangar,
    /// Open the item hangar window.
    OpenItemHangar,
    /// Open the market window.
    OpenMarket,
    /// Board the given assembled ship.
    ActivateShip {
        /// The ship to board.
        item_id: ItemId,
    },
    /// Load the market orders for a type into the market window.
    LoadMarketType {
        /// The type to display.
        type_id: TypeId,
    },
    /// Buy from a sell order.
    Buy {
        /// The order to buy from.
        order_id: OrderId,
        /// Units to buy.
        quantity: u64,
        /// Where the purchase may be filled.
        range: OrderRange,
    },
    /// Close the market window. No-op when it is not open.
    CloseMarket,
}

/// Live view of the game client consumed by storyline handlers.
///
/// Every query returns a fresh snapshot; handlers must not cache them across
/// ticks. Window queries return `None` while the window is not open.
/// Implementations are shared between concurrent attempts, so `execute`
/// takes `&self` and is fire-and-forget.
pub trait GameClient: Send + Sync {
    /// Group of the ship the pilot is currently flying.
    fn active_ship_group(&self) -> Option<GroupId>;

    /// The ship hangar window, if open.
    fn ship_hangar(&self) -> Option<HangarWindow>;

    /// The item hangar window, if open.
    fn item_hangar(&self) -> Option<HangarWindow>;

    /// The market window, if open.
    fn market_window(&self) -> Option<MarketWindow>;

    /// Median sell price for a type, if metadata is available.
    fn median_sell_price(&self, type_id: TypeId) -> Option<f64>;

    /// The station the pilot is docked in, if any.
    fn station_id(&self) -> Option<StationId>;

    /// Issue a command. Results are observed through later snapshots.
    fn execute(&self, command: ClientCommand);
}
