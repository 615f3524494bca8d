//! "Materials For War Preparation": deliver 8000 kernite to the agent.
//!
//! There is nothing to fight or haul once accepted, so the handler travels
//! in a shuttle when one is available and buys the kernite at the agent's
//! station before accepting. If the station cannot supply it at a sane price
//! the agent is blacklisted for the session. The mission is never declined.

use chrono::TimeDelta;
use questline_core::client::{
    ClientCommand, GroupId, OrderId, OrderRange, SellOrder, StationId, TypeId,
};
use questline_core::storyline::{PhaseOutcome, PhaseTick, Storyline, StorylineState};
use questline_core::window::Readiness;
use tracing::{debug, info, warn};

/// Kernite.
pub const KERNITE: TypeId = TypeId(20);

/// Shuttles.
pub const SHUTTLE_GROUP: GroupId = GroupId(31);

/// Units of kernite the mission asks for.
pub const REQUIRED_KERNITE: u64 = 8000;

/// Orders priced at or above this multiple of the median sell are ignored.
pub const PRICE_CEILING_MULTIPLIER: f64 = 2.0;

/// Settle time after opening a window, boarding a ship, or buying.
const COMMAND_SETTLE_SECS: i64 = 10;

/// Settle time after asking the market window to show another type.
const MARKET_LOAD_SECS: i64 = 5;

fn command_settle() -> TimeDelta {
    TimeDelta::seconds(COMMAND_SETTLE_SECS)
}

/// What to do with the market once kernite orders are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Procurement {
    /// Buy `quantity` units from `order_id`.
    Buy { order_id: OrderId, quantity: u64 },
    /// The station cannot supply the remainder under the price ceiling.
    Unworkable,
}

/// Picks the next purchase towards `needed` units.
///
/// Only orders at `station`, with stock left, and priced strictly below
/// `ceiling` qualify. The cheapest qualifying order wins; among equal prices
/// the first listed one does.
pub(crate) fn plan_procurement(
    orders: &[SellOrder],
    station: Option<StationId>,
    ceiling: Option<f64>,
    needed: u64,
) -> Procurement {
    let (Some(station), Some(ceiling)) = (station, ceiling) else {
        return Procurement::Unworkable;
    };

    let qualifying: Vec<&SellOrder> = orders
        .iter()
        .filter(|o| o.station_id == station && o.price < ceiling && o.volume_remaining > 0)
        .collect();

    let available = qualifying
        .iter()
        .map(|o| o.volume_remaining)
        .fold(0, u64::saturating_add);
    if available < needed {
        return Procurement::Unworkable;
    }

    match qualifying
        .into_iter()
        .min_by(|a, b| a.price.total_cmp(&b.price))
    {
        Some(order) => Procurement::Buy {
            order_id: order.order_id,
            quantity: needed.min(order.volume_remaining),
        },
        None => Procurement::Unworkable,
    }
}

/// Handler for the "Materials For War Preparation" storyline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialsForWarPreparation;

impl MaterialsForWarPreparation {
    /// The mission name this handler is registered under.
    pub const MISSION_NAME: &'static str = "Materials For War Preparation";
}

impl Storyline for MaterialsForWarPreparation {
    /// Boards an assembled shuttle if one is in the ship hangar.
    fn arm(&self, tick: &PhaseTick<'_>) -> PhaseOutcome {
        const PHASE: StorylineState = StorylineState::Arm;

        if tick.is_gated() {
            return tick.transition(PHASE);
        }

        if tick.client.active_ship_group() == Some(SHUTTLE_GROUP) {
            return tick.transition(StorylineState::GotoAgent);
        }

        let hangar = match Readiness::classify(tick.client.ship_hangar()) {
            Readiness::Closed => {
                info!(agent_id = %tick.context.agent_id, "opening ship hangar");
                return tick.command(ClientCommand::OpenShipHangar, PHASE, command_settle());
            }
            Readiness::Loading => {
                debug!("waiting for ship hangar");
                return tick.transition(PHASE);
            }
            Readiness::Ready(hangar) => hangar,
        };

        if let Some(shuttle) = hangar.assembled_in_group(SHUTTLE_GROUP) {
            info!(item_id = %shuttle.item_id, "switching to shuttle");
            tick.command(
                ClientCommand::ActivateShip {
                    item_id: shuttle.item_id,
                },
                PHASE,
                command_settle(),
            )
        } else {
            info!("no shuttle found, travelling in the active ship");
            tick.transition(StorylineState::GotoAgent)
        }
    }

    /// Buys kernite at the current station until 8000 units are on hand.
    fn pre_accept_mission(&self, tick: &PhaseTick<'_>) -> PhaseOutcome {
        const PHASE: StorylineState = StorylineState::PreAcceptMission;

        if tick.is_gated() {
            return tick.transition(PHASE);
        }

        let hangar = match Readiness::classify(tick.client.item_hangar()) {
            Readiness::Closed => {
                info!("opening item hangar");
                return tick.command(ClientCommand::OpenItemHangar, PHASE, command_settle());
            }
            Readiness::Loading => {
                debug!("waiting for item hangar");
                return tick.transition(PHASE);
            }
            Readiness::Ready(hangar) => hangar,
        };

        let market = tick.client.market_window();
        let on_hand = hangar.quantity_of(KERNITE);

        if on_hand >= REQUIRED_KERNITE {
            info!(on_hand, "enough kernite in hangar, accepting mission");
            if market.is_some() {
                tick.client.execute(ClientCommand::CloseMarket);
            }
            return tick.transition(StorylineState::AcceptMission);
        }

        let market = match Readiness::classify(market) {
            Readiness::Closed => {
                info!("opening market window");
                return tick.command(ClientCommand::OpenMarket, PHASE, command_settle());
            }
            Readiness::Loading => {
                debug!("waiting for market window");
                return tick.transition(PHASE);
            }
            Readiness::Ready(market) => market,
        };

        if market.detail_type_id != Some(KERNITE) {
            info!("loading kernite into market window");
            return tick.command(
                ClientCommand::LoadMarketType { type_id: KERNITE },
                PHASE,
                TimeDelta::seconds(MARKET_LOAD_SECS),
            );
        }

        let median = tick.client.median_sell_price(KERNITE);
        if median.is_none() {
            warn!(type_id = %KERNITE, "no median sell price known");
        }
        let ceiling = median.map(|price| price * PRICE_CEILING_MULTIPLIER);
        let needed = REQUIRED_KERNITE - on_hand;

        match plan_procurement(&market.sell_orders, tick.client.station_id(), ceiling, needed) {
            Procurement::Buy { order_id, quantity } => {
                info!(%order_id, quantity, needed, "buying kernite");
                tick.command(
                    ClientCommand::Buy {
                        order_id,
                        quantity,
                        range: OrderRange::Station,
                    },
                    PHASE,
                    command_settle(),
                )
            }
            Procurement::Unworkable => {
                warn!(
                    agent_id = %tick.context.agent_id,
                    needed,
                    "not enough reasonably priced kernite available, blacklisting agent for this session"
                );
                tick.client.execute(ClientCommand::CloseMarket);
                tick.transition(StorylineState::BlacklistAgent)
            }
        }
    }

    /// Nothing to do after accepting.
    fn post_accept_mission(&self, tick: &PhaseTick<'_>) -> PhaseOutcome {
        tick.transition(StorylineState::CompleteMission)
    }

    /// Nothing to execute.
    fn execute_mission(&self, tick: &PhaseTick<'_>) -> PhaseOutcome {
        tick.transition(StorylineState::CompleteMission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use questline_core::client::{
        AgentId, HangarItem, HangarWindow, ItemId, ItemQuantity, MarketWindow,
    };
    use questline_core::gate::TimeGate;
    use questline_core::storyline::StorylineContext;
    use questline_test_support::RecordingGameClient;

    const STATION: StationId = StationId(60_003_760);
    const ELSEWHERE: StationId = StationId(60_008_494);

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn context() -> StorylineContext {
        StorylineContext::new(AgentId(3_008_416), MaterialsForWarPreparation::MISSION_NAME)
    }

    fn tick<'a>(
        context: &'a StorylineContext,
        client: &'a RecordingGameClient,
        gate: TimeGate,
    ) -> PhaseTick<'a> {
        PhaseTick {
            context,
            client,
            now: fixed_now(),
            gate,
        }
    }

    fn closed_gate() -> TimeGate {
        TimeGate::open().hold(fixed_now(), TimeDelta::seconds(3))
    }

    fn ship(item_id: i64, group_id: GroupId, quantity: ItemQuantity) -> HangarItem {
        HangarItem {
            item_id: ItemId(item_id),
            type_id: TypeId(11_129),
            group_id,
            quantity,
        }
    }

    fn kernite(item_id: i64, units: u64) -> HangarItem {
        HangarItem {
            item_id: ItemId(item_id),
            type_id: KERNITE,
            group_id: GroupId(453),
            quantity: ItemQuantity::Stack(units),
        }
    }

    fn hangar(items: Vec<HangarItem>) -> HangarWindow {
        HangarWindow { ready: true, items }
    }

    fn order(order_id: i64, station_id: StationId, price: f64, volume: u64) -> SellOrder {
        SellOrder {
            order_id: OrderId(order_id),
            station_id,
            price,
            volume_remaining: volume,
        }
    }

    fn kernite_market(orders: Vec<SellOrder>) -> MarketWindow {
        MarketWindow {
            ready: true,
            detail_type_id: Some(KERNITE),
            sell_orders: orders,
        }
    }

    /// A docked client with kernite on hand and kernite orders displayed.
    fn market_client(on_hand: u64, orders: Vec<SellOrder>) -> RecordingGameClient {
        RecordingGameClient::new()
            .with_station(STATION)
            .with_median_sell(KERNITE, 10.0)
            .with_item_hangar(hangar(vec![kernite(1, on_hand)]))
            .with_market(kernite_market(orders))
    }

    // ---- plan_procurement ----

    #[test]
    fn test_plan_picks_cheapest_qualifying_order() {
        // Arrange
        let orders = vec![
            order(1, STATION, 14.0, 9000),
            order(2, STATION, 12.0, 3000),
            order(3, ELSEWHERE, 1.0, 50_000),
        ];

        // Act
        let plan = plan_procurement(&orders, Some(STATION), Some(20.0), 8000);

        // Assert
        assert_eq!(
            plan,
            Procurement::Buy {
                order_id: OrderId(2),
                quantity: 3000
            }
        );
    }

    #[test]
    fn test_plan_breaks_price_ties_by_listing_order() {
        let orders = vec![order(7, STATION, 12.0, 9000), order(8, STATION, 12.0, 9000)];

        let plan = plan_procurement(&orders, Some(STATION), Some(20.0), 100);

        assert_eq!(
            plan,
            Procurement::Buy {
                order_id: OrderId(7),
                quantity: 100
            }
        );
    }

    #[test]
    fn test_plan_never_selects_order_at_ceiling() {
        let orders = vec![order(1, STATION, 20.0, 8000)];

        let plan = plan_procurement(&orders, Some(STATION), Some(20.0), 8000);

        assert_eq!(plan, Procurement::Unworkable);
    }

    #[test]
    fn test_plan_ignores_empty_orders() {
        let orders = vec![order(1, STATION, 1.0, 0), order(2, STATION, 15.0, 500)];

        let plan = plan_procurement(&orders, Some(STATION), Some(20.0), 500);

        assert_eq!(
            plan,
            Procurement::Buy {
                order_id: OrderId(2),
                quantity: 500
            }
        );
    }

    #[test]
    fn test_plan_without_station_or_median_is_unworkable() {
        let orders = vec![order(1, STATION, 1.0, 8000)];

        assert_eq!(
            plan_procurement(&orders, None, Some(20.0), 8000),
            Procurement::Unworkable
        );
        assert_eq!(
            plan_procurement(&orders, Some(STATION), None, 8000),
            Procurement::Unworkable
        );
    }

    #[test]
    fn test_plan_counts_only_remaining_need() {
        // The first of two orders was already bought out.
        let orders = vec![order(2, STATION, 13.0, 4000)];

        let plan = plan_procurement(&orders, Some(STATION), Some(20.0), 4000);

        assert_eq!(
            plan,
            Procurement::Buy {
                order_id: OrderId(2),
                quantity: 4000
            }
        );
    }

    #[test]
    fn test_plan_handles_volumes_near_u64_max() {
        let orders = vec![order(1, STATION, 1.0, u64::MAX), order(2, STATION, 1.0, 2)];

        let plan = plan_procurement(&orders, Some(STATION), Some(20.0), 8000);

        assert_eq!(
            plan,
            Procurement::Buy {
                order_id: OrderId(1),
                quantity: 8000
            }
        );
    }

    // ---- arm ----

    #[test]
    fn test_arm_is_noop_while_gated() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new();
        let gate = closed_gate();

        // Act
        let outcome = MaterialsForWarPreparation.arm(&tick(&context, &client, gate));

        // Assert
        assert_eq!(outcome.next, StorylineState::Arm);
        assert_eq!(outcome.gate, gate);
        assert!(client.commands().is_empty());
        assert_eq!(client.ship_hangar_reads(), 0);
    }

    #[test]
    fn test_arm_in_shuttle_goes_to_agent_without_touching_hangar() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new().with_active_ship_group(SHUTTLE_GROUP);

        // Act
        let outcome = MaterialsForWarPreparation.arm(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::GotoAgent);
        assert_eq!(outcome.gate, TimeGate::open());
        assert_eq!(client.ship_hangar_reads(), 0);
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_arm_opens_ship_hangar_and_holds_gate() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new().with_active_ship_group(GroupId(26));

        // Act
        let outcome = MaterialsForWarPreparation.arm(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::Arm);
        assert_eq!(
            outcome.gate.not_before(),
            Some(fixed_now() + TimeDelta::seconds(10))
        );
        assert_eq!(client.commands(), vec![ClientCommand::OpenShipHangar]);
    }

    #[test]
    fn test_arm_waits_for_loading_hangar_without_commands() {
        let context = context();
        let client = RecordingGameClient::new().with_ship_hangar(HangarWindow {
            ready: false,
            items: Vec::new(),
        });

        let outcome = MaterialsForWarPreparation.arm(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::Arm);
        assert_eq!(outcome.gate, TimeGate::open());
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_arm_activates_assembled_shuttle() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new()
            .with_active_ship_group(GroupId(26))
            .with_ship_hangar(hangar(vec![
                ship(1, SHUTTLE_GROUP, ItemQuantity::Stack(1)),
                ship(2, GroupId(26), ItemQuantity::Assembled),
                ship(3, SHUTTLE_GROUP, ItemQuantity::Assembled),
            ]));

        // Act
        let outcome = MaterialsForWarPreparation.arm(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::Arm);
        assert!(!outcome.gate.is_open(fixed_now()));
        assert_eq!(
            client.commands(),
            vec![ClientCommand::ActivateShip { item_id: ItemId(3) }]
        );
    }

    #[test]
    fn test_arm_without_shuttle_falls_back_to_active_ship() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new()
            .with_active_ship_group(GroupId(26))
            .with_ship_hangar(hangar(vec![ship(1, SHUTTLE_GROUP, ItemQuantity::Stack(1))]));

        // Act
        let outcome = MaterialsForWarPreparation.arm(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::GotoAgent);
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_arm_goes_to_agent_once_shuttle_boarded() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new()
            .with_active_ship_group(GroupId(26))
            .with_ship_hangar(hangar(vec![ship(3, SHUTTLE_GROUP, ItemQuantity::Assembled)]));
        let first = MaterialsForWarPreparation.arm(&tick(&context, &client, TimeGate::open()));

        // Act: the client reports the shuttle after the gate elapses.
        client.set_active_ship_group(Some(SHUTTLE_GROUP));
        client.set_ship_hangar(None);
        client.clear_commands();
        let later = PhaseTick {
            now: fixed_now() + TimeDelta::seconds(10),
            ..tick(&context, &client, first.gate)
        };
        let second = MaterialsForWarPreparation.arm(&later);

        // Assert
        assert_eq!(first.next, StorylineState::Arm);
        assert_eq!(second.next, StorylineState::GotoAgent);
        assert!(client.commands().is_empty());
        assert_eq!(client.ship_hangar_reads(), 1);
    }

    // ---- pre_accept_mission ----

    #[test]
    fn test_pre_accept_is_noop_while_gated() {
        let context = context();
        let client = market_client(0, vec![order(1, STATION, 15.0, 8000)]);
        let gate = closed_gate();

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, gate));

        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(outcome.gate, gate);
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_pre_accept_opens_item_hangar() {
        let context = context();
        let client = RecordingGameClient::new();

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(
            outcome.gate.not_before(),
            Some(fixed_now() + TimeDelta::seconds(10))
        );
        assert_eq!(client.commands(), vec![ClientCommand::OpenItemHangar]);
    }

    #[test]
    fn test_pre_accept_waits_for_loading_item_hangar() {
        let context = context();
        let client = RecordingGameClient::new().with_item_hangar(HangarWindow {
            ready: false,
            items: Vec::new(),
        });

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(outcome.gate, TimeGate::open());
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_pre_accept_with_enough_kernite_closes_market_and_accepts() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new()
            .with_item_hangar(hangar(vec![kernite(1, 5000), kernite(2, 3000)]))
            .with_market(kernite_market(Vec::new()));

        // Act
        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::AcceptMission);
        assert_eq!(client.commands(), vec![ClientCommand::CloseMarket]);
    }

    #[test]
    fn test_pre_accept_with_enough_kernite_and_no_market_issues_nothing() {
        let context = context();
        let client =
            RecordingGameClient::new().with_item_hangar(hangar(vec![kernite(1, 9000)]));

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::AcceptMission);
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_pre_accept_opens_market_when_short() {
        let context = context();
        let client = RecordingGameClient::new().with_item_hangar(hangar(vec![kernite(1, 100)]));

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(
            outcome.gate.not_before(),
            Some(fixed_now() + TimeDelta::seconds(10))
        );
        assert_eq!(client.commands(), vec![ClientCommand::OpenMarket]);
    }

    #[test]
    fn test_pre_accept_waits_for_loading_market() {
        let context = context();
        let client = RecordingGameClient::new()
            .with_item_hangar(hangar(Vec::new()))
            .with_market(MarketWindow::default());

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(outcome.gate, TimeGate::open());
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_pre_accept_loads_kernite_orders_with_short_gate() {
        // Arrange
        let context = context();
        let client = RecordingGameClient::new()
            .with_item_hangar(hangar(Vec::new()))
            .with_market(MarketWindow {
                ready: true,
                detail_type_id: Some(TypeId(34)),
                sell_orders: Vec::new(),
            });

        // Act
        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(
            outcome.gate.not_before(),
            Some(fixed_now() + TimeDelta::seconds(5))
        );
        assert_eq!(
            client.commands(),
            vec![ClientCommand::LoadMarketType { type_id: KERNITE }]
        );
    }

    #[test]
    fn test_pre_accept_buys_full_need_from_single_order() {
        // Arrange
        let context = context();
        let client = market_client(0, vec![order(42, STATION, 15.0, 8000)]);

        // Act
        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::PreAcceptMission);
        assert_eq!(
            outcome.gate.not_before(),
            Some(fixed_now() + TimeDelta::seconds(10))
        );
        assert_eq!(
            client.commands(),
            vec![ClientCommand::Buy {
                order_id: OrderId(42),
                quantity: 8000,
                range: OrderRange::Station,
            }]
        );
    }

    #[test]
    fn test_pre_accept_buys_only_remaining_need() {
        let context = context();
        let client = market_client(6500, vec![order(42, STATION, 15.0, 8000)]);

        MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(
            client.commands(),
            vec![ClientCommand::Buy {
                order_id: OrderId(42),
                quantity: 1500,
                range: OrderRange::Station,
            }]
        );
    }

    #[test]
    fn test_pre_accept_blacklists_when_only_order_is_overpriced() {
        // Arrange
        let context = context();
        let client = market_client(0, vec![order(42, STATION, 25.0, 50_000)]);

        // Act
        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        // Assert
        assert_eq!(outcome.next, StorylineState::BlacklistAgent);
        assert_eq!(client.commands(), vec![ClientCommand::CloseMarket]);
    }

    #[test]
    fn test_pre_accept_blacklists_when_supply_short_of_need() {
        let context = context();
        let client = market_client(
            1000,
            vec![order(1, STATION, 11.0, 4000), order(2, STATION, 12.0, 2999)],
        );

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::BlacklistAgent);
        assert_eq!(client.commands(), vec![ClientCommand::CloseMarket]);
    }

    #[test]
    fn test_pre_accept_ignores_orders_at_other_stations() {
        let context = context();
        let client = market_client(0, vec![order(1, ELSEWHERE, 11.0, 8000)]);

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::BlacklistAgent);
    }

    #[test]
    fn test_pre_accept_blacklists_without_median_price() {
        let context = context();
        let client = RecordingGameClient::new()
            .with_station(STATION)
            .with_item_hangar(hangar(Vec::new()))
            .with_market(kernite_market(vec![order(1, STATION, 1.0, 8000)]));

        let outcome =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        assert_eq!(outcome.next, StorylineState::BlacklistAgent);
    }

    #[test]
    fn test_pre_accept_buys_then_accepts_once_delivered() {
        // Arrange
        let context = context();
        let client = market_client(0, vec![order(42, STATION, 15.0, 8000)]);

        // Act: first poll buys.
        let first =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));
        client.set_item_hangar(Some(hangar(vec![kernite(9, 8000)])));
        client.clear_commands();
        let later = PhaseTick {
            now: fixed_now() + TimeDelta::seconds(10),
            ..tick(&context, &client, first.gate)
        };
        let second = MaterialsForWarPreparation.pre_accept_mission(&later);

        // Assert
        assert_eq!(first.next, StorylineState::PreAcceptMission);
        assert_eq!(second.next, StorylineState::AcceptMission);
        assert_eq!(client.commands(), vec![ClientCommand::CloseMarket]);
    }

    #[test]
    fn test_pre_accept_reopens_market_closed_between_polls() {
        // Arrange
        let context = context();
        let client = market_client(0, vec![order(42, STATION, 15.0, 8000)]);
        let first =
            MaterialsForWarPreparation.pre_accept_mission(&tick(&context, &client, TimeGate::open()));

        // Act: half the purchase arrived and the market window was closed.
        client.set_item_hangar(Some(hangar(vec![kernite(9, 4000)])));
        client.set_market(None);
        client.clear_commands();
        let later = PhaseTick {
            now: fixed_now() + TimeDelta::seconds(10),
            ..tick(&context, &client, first.gate)
        };
        let second = MaterialsForWarPreparation.pre_accept_mission(&later);

        // Assert
        assert_eq!(second.next, StorylineState::PreAcceptMission);
        assert_eq!(client.commands(), vec![ClientCommand::OpenMarket]);
    }

    // ---- post_accept_mission / execute_mission ----

    #[test]
    fn test_post_accept_and_execute_complete_without_side_effects() {
        let context = context();
        let client = market_client(0, vec![order(42, STATION, 15.0, 8000)]);

        for gate in [TimeGate::open(), closed_gate()] {
            let phase_tick = tick(&context, &client, gate);

            let post = MaterialsForWarPreparation.post_accept_mission(&phase_tick);
            let execute = MaterialsForWarPreparation.execute_mission(&phase_tick);

            assert_eq!(post.next, StorylineState::CompleteMission);
            assert_eq!(execute.next, StorylineState::CompleteMission);
            assert_eq!(post.gate, gate);
        }
        assert!(client.commands().is_empty());
    }
}
