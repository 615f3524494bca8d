//! Recording game client — a scripted `GameClient` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use questline_core::client::{
    ClientCommand, GameClient, GroupId, HangarItem, HangarWindow, ItemId, ItemQuantity,
    MarketWindow, OrderId, SellOrder, StationId, TypeId,
};

#[derive(Debug, Default)]
struct ClientState {
    active_ship_group: Option<GroupId>,
    station_id: Option<StationId>,
    median_sell: HashMap<TypeId, f64>,
    ship_hangar: Option<HangarWindow>,
    item_hangar: Option<HangarWindow>,
    market: Option<MarketWindow>,
    stored_ships: Vec<HangarItem>,
    stored_items: Vec<HangarItem>,
    order_books: HashMap<TypeId, Vec<SellOrder>>,
    next_item_id: i64,
    ship_hangar_reads: u32,
    commands: Vec<ClientCommand>,
}

/// A game client whose snapshots are scripted by the test, and which records
/// every command it receives.
///
/// By default commands only get recorded. A [`responsive`](Self::responsive)
/// client also applies them: open commands open ready windows over the
/// stored contents, market loads show the stocked order book, buys move
/// units into the item hangar, and so on.
#[derive(Debug, Default)]
pub struct RecordingGameClient {
    responsive: bool,
    state: Mutex<ClientState>,
}

impl RecordingGameClient {
    /// A client that records commands without applying them.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that applies the commands it receives.
    #[must_use]
    pub fn responsive() -> Self {
        Self {
            responsive: true,
            ..Self::default()
        }
    }

    fn state_mut(&mut self) -> &mut ClientState {
        self.state.get_mut().unwrap()
    }

    /// Sets the group of the active ship.
    #[must_use]
    pub fn with_active_ship_group(mut self, group_id: GroupId) -> Self {
        self.state_mut().active_ship_group = Some(group_id);
        self
    }

    /// Docks the pilot at `station_id`.
    #[must_use]
    pub fn with_station(mut self, station_id: StationId) -> Self {
        self.state_mut().station_id = Some(station_id);
        self
    }

    /// Sets the median sell price of a type.
    #[must_use]
    pub fn with_median_sell(mut self, type_id: TypeId, price: f64) -> Self {
        self.state_mut().median_sell.insert(type_id, price);
        self
    }

    /// Sets the ship hangar window as currently open.
    #[must_use]
    pub fn with_ship_hangar(mut self, window: HangarWindow) -> Self {
        self.state_mut().ship_hangar = Some(window);
        self
    }

    /// Sets the item hangar window as currently open.
    #[must_use]
    pub fn with_item_hangar(mut self, window: HangarWindow) -> Self {
        self.state_mut().item_hangar = Some(window);
        self
    }

    /// Sets the market window as currently open.
    #[must_use]
    pub fn with_market(mut self, window: MarketWindow) -> Self {
        self.state_mut().market = Some(window);
        self
    }

    /// Ships listed when a responsive client opens the ship hangar.
    #[must_use]
    pub fn with_stored_ships(mut self, ships: Vec<HangarItem>) -> Self {
        self.state_mut().stored_ships = ships;
        self
    }

    /// Items listed when a responsive client opens the item hangar.
    #[must_use]
    pub fn with_stored_items(mut self, items: Vec<HangarItem>) -> Self {
        self.state_mut().stored_items = items;
        self
    }

    /// Sell orders shown when a responsive client loads `type_id`.
    #[must_use]
    pub fn with_order_book(mut self, type_id: TypeId, orders: Vec<SellOrder>) -> Self {
        self.state_mut().order_books.insert(type_id, orders);
        self
    }

    /// Replaces the item hangar window.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_item_hangar(&self, window: Option<HangarWindow>) {
        self.state.lock().unwrap().item_hangar = window;
    }

    /// Replaces the market window.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_market(&self, window: Option<MarketWindow>) {
        self.state.lock().unwrap().market = window;
    }

    /// Replaces the ship hangar window.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_ship_hangar(&self, window: Option<HangarWindow>) {
        self.state.lock().unwrap().ship_hangar = window;
    }

    /// Changes the active ship group.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_active_ship_group(&self, group_id: Option<GroupId>) {
        self.state.lock().unwrap().active_ship_group = group_id;
    }

    /// Returns a snapshot of all commands received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn commands(&self) -> Vec<ClientCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Number of times the ship hangar window has been queried.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn ship_hangar_reads(&self) -> u32 {
        self.state.lock().unwrap().ship_hangar_reads
    }

    /// Forgets the commands received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear_commands(&self) {
        self.state.lock().unwrap().commands.clear();
    }
}

impl ClientState {
    fn apply(&mut self, command: &ClientCommand) {
        match command {
            ClientCommand::OpenShipHangar => {
                self.ship_hangar = Some(HangarWindow {
                    ready: true,
                    items: self.stored_ships.clone(),
                });
            }
            ClientCommand::OpenItemHangar => {
                self.item_hangar = Some(HangarWindow {
                    ready: true,
                    items: self.stored_items.clone(),
                });
            }
            ClientCommand::OpenMarket => {
                self.market = Some(MarketWindow {
                    ready: true,
                    ..MarketWindow::default()
                });
            }
            ClientCommand::ActivateShip { item_id } => {
                if let Some(ship) = self.stored_ships.iter().find(|s| s.item_id == *item_id) {
                    self.active_ship_group = Some(ship.group_id);
                }
            }
            ClientCommand::LoadMarketType { type_id } => {
                let orders = self.order_books.get(type_id).cloned().unwrap_or_default();
                if let Some(market) = self.market.as_mut() {
                    market.detail_type_id = Some(*type_id);
                    market.sell_orders = orders;
                }
            }
            ClientCommand::Buy {
                order_id, quantity, ..
            } => self.fill(*order_id, *quantity),
            ClientCommand::CloseMarket => self.market = None,
        }
    }

    fn fill(&mut self, order_id: OrderId, quantity: u64) {
        let Some((type_id, filled)) = self.order_books.iter_mut().find_map(|(type_id, book)| {
            let order = book.iter_mut().find(|o| o.order_id == order_id)?;
            let filled = quantity.min(order.volume_remaining);
            order.volume_remaining -= filled;
            Some((*type_id, filled))
        }) else {
            return;
        };

        if let Some(market) = self.market.as_mut() {
            if market.detail_type_id == Some(type_id) {
                market.sell_orders = self.order_books[&type_id].clone();
            }
        }

        self.next_item_id += 1;
        let bought = HangarItem {
            item_id: ItemId(1_000_000 + self.next_item_id),
            type_id,
            group_id: GroupId(0),
            quantity: ItemQuantity::Stack(filled),
        };
        self.stored_items.push(bought.clone());
        if let Some(hangar) = self.item_hangar.as_mut() {
            hangar.items.push(bought);
        }
    }
}

impl GameClient for RecordingGameClient {
    fn active_ship_group(&self) -> Option<GroupId> {
        self.state.lock().unwrap().active_ship_group
    }

    fn ship_hangar(&self) -> Option<HangarWindow> {
        let mut state = self.state.lock().unwrap();
        state.ship_hangar_reads += 1;
        state.ship_hangar.clone()
    }

    fn item_hangar(&self) -> Option<HangarWindow> {
        self.state.lock().unwrap().item_hangar.clone()
    }

    fn market_window(&self) -> Option<MarketWindow> {
        self.state.lock().unwrap().market.clone()
    }

    fn median_sell_price(&self, type_id: TypeId) -> Option<f64> {
        self.state.lock().unwrap().median_sell.get(&type_id).copied()
    }

    fn station_id(&self) -> Option<StationId> {
        self.state.lock().unwrap().station_id
    }

    fn execute(&self, command: ClientCommand) {
        let mut state = self.state.lock().unwrap();
        if self.responsive {
            state.apply(&command);
        }
        state.commands.push(command);
    }
}
