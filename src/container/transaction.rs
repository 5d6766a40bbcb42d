//! Item-stack request processing
//!
//! Clients describe inventory edits as ordered action lists correlated by
//! a request id. Actions run strictly in order; a failed action answers an
//! error response for its request and later actions still run. A count
//! that contradicts server-held state is a protocol violation and aborts
//! the whole batch so the session can be dropped.

use thiserror::Error;

use super::Container;
use crate::error::{SimError, SimResult};
use crate::item::ItemStack;
use crate::registry::{ItemType, TypeRegistry};

/// Client-addressable container surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerName {
    Cursor,
    Hotbar,
    Inventory,
    HotbarAndInventory,
    Armor,
    CraftingInput,
    /// Virtual source slot for creative crafting
    CreativeOutput,
    /// The block container the player currently has open
    Opened,
}

/// One slot within a named container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub container: ContainerName,
    pub slot: u8,
}

impl SlotRef {
    pub fn new(container: ContainerName, slot: u8) -> Self {
        Self { container, slot }
    }
}

/// A single edit within a request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestAction {
    Take {
        count: u8,
        source: SlotRef,
        destination: SlotRef,
    },
    Place {
        count: u8,
        source: SlotRef,
        destination: SlotRef,
    },
    Swap {
        source: SlotRef,
        destination: SlotRef,
    },
    Drop {
        count: u8,
        source: SlotRef,
        randomly: bool,
    },
    Destroy {
        count: u8,
        source: SlotRef,
    },
    CraftCreative {
        network_id: i32,
        count: u8,
    },
}

/// Ordered action list correlated by the client's request id
#[derive(Debug, Clone, PartialEq)]
pub struct StackRequest {
    pub request_id: i32,
    pub actions: Vec<RequestAction>,
}

/// Recoverable per-action failures, reported back under the request id
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    #[error("source slot is empty")]
    EmptySource,

    #[error("destination holds an incompatible stack")]
    IncompatibleDestination,

    #[error("unknown creative network id {0}")]
    UnknownCreativeItem(i32),

    #[error("count {count} exceeds the stack limit {max}")]
    CountExceedsLimit { count: i32, max: i32 },

    #[error("container {0:?} is not accessible")]
    InaccessibleContainer(ContainerName),

    #[error("slot {slot} out of range for {container:?}")]
    SlotOutOfRange {
        container: ContainerName,
        slot: u8,
    },

    #[error("action requires creative mode")]
    RequiresCreative,

    #[error("no creative item was crafted")]
    MissingCreativeItem,
}

/// Per-slot summary inside a response snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub slot: u8,
    pub count: i32,
    pub network_id: i32,
}

/// Full contents of one touched container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    pub container: ContainerName,
    pub slots: Vec<SlotInfo>,
}

/// Outcome of one request
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseStatus {
    Ok,
    Error { cause: TransactionError },
}

/// Answer to one request, correlated by its id
#[derive(Debug, Clone, PartialEq)]
pub struct StackResponse {
    pub request_id: i32,
    pub status: ResponseStatus,
    pub containers: Vec<ContainerSnapshot>,
}

/// A stack leaving the inventory for the world
#[derive(Debug, Clone)]
pub struct DroppedItem {
    pub stack: ItemStack,
    pub randomly: bool,
}

/// Everything a request batch is allowed to touch
pub struct ContainerViews<'a> {
    pub cursor: &'a mut Container,
    pub inventory: &'a mut Container,
    pub armor: &'a mut Container,
    pub crafting_input: &'a mut Container,
    pub opened: Option<&'a mut Container>,
}

/// Result of a processed batch
#[derive(Debug, Default)]
pub struct TransactionOutcome {
    pub responses: Vec<StackResponse>,
    pub dropped: Vec<DroppedItem>,
}

/// Process a batch of requests against the given container views.
///
/// Recoverable failures turn into error responses; a count mismatch
/// against server state aborts with a protocol violation.
pub fn process_requests(
    views: &mut ContainerViews<'_>,
    requests: &[StackRequest],
    items: &TypeRegistry<ItemType>,
    creative: bool,
) -> SimResult<TransactionOutcome> {
    let mut outcome = TransactionOutcome::default();

    for request in requests {
        let mut touched: Vec<ContainerName> = Vec::new();
        let mut failure: Option<TransactionError> = None;
        // Stack synthesized by CraftCreative, consumed by a following Take
        let mut pending_creative: Option<ItemStack> = None;

        for action in &request.actions {
            let result = apply_action(
                views,
                action,
                items,
                creative,
                &mut pending_creative,
                &mut touched,
                &mut outcome.dropped,
            )?;
            if let Err(error) = result {
                log::warn!(
                    "Stack request {} action failed: {}",
                    request.request_id,
                    error
                );
                if failure.is_none() {
                    failure = Some(error);
                }
            }
        }

        let status = match failure {
            None => ResponseStatus::Ok,
            Some(cause) => ResponseStatus::Error { cause },
        };
        outcome.responses.push(StackResponse {
            request_id: request.request_id,
            status,
            containers: snapshot_containers(views, &touched),
        });
    }

    Ok(outcome)
}

type ActionResult = Result<(), TransactionError>;

#[allow(clippy::too_many_arguments)]
fn apply_action(
    views: &mut ContainerViews<'_>,
    action: &RequestAction,
    items: &TypeRegistry<ItemType>,
    creative: bool,
    pending_creative: &mut Option<ItemStack>,
    touched: &mut Vec<ContainerName>,
    dropped: &mut Vec<DroppedItem>,
) -> SimResult<ActionResult> {
    match action {
        RequestAction::Take {
            count,
            source,
            destination,
        }
        | RequestAction::Place {
            count,
            source,
            destination,
        } => move_items(
            views,
            *count as i32,
            *source,
            *destination,
            creative,
            pending_creative,
            touched,
        ),

        RequestAction::Swap {
            source,
            destination,
        } => swap_slots(views, *source, *destination, touched),

        RequestAction::Drop {
            count,
            source,
            randomly,
        } => {
            let taken = match remove_from(views, *count as i32, *source, creative, touched)? {
                Ok(stack) => stack,
                Err(error) => return Ok(Err(error)),
            };
            dropped.push(DroppedItem {
                stack: taken,
                randomly: *randomly,
            });
            Ok(Ok(()))
        }

        RequestAction::Destroy { count, source } => {
            match remove_from(views, *count as i32, *source, creative, touched)? {
                Ok(_) => Ok(Ok(())),
                Err(error) => Ok(Err(error)),
            }
        }

        RequestAction::CraftCreative { network_id, count } => {
            if !creative {
                return Ok(Err(TransactionError::RequiresCreative));
            }
            let Some(item_type) = items.get_by_network_id(*network_id) else {
                return Ok(Err(TransactionError::UnknownCreativeItem(*network_id)));
            };
            let count = *count as i32;
            let max = item_type.max_stack_size();
            if count < 1 || count > max {
                return Ok(Err(TransactionError::CountExceedsLimit { count, max }));
            }
            *pending_creative = Some(ItemStack::new(item_type, count));
            Ok(Ok(()))
        }
    }
}

/// Shared Take/Place logic: split `count` off the source and land it in
/// the destination, merging when compatible.
fn move_items(
    views: &mut ContainerViews<'_>,
    count: i32,
    source: SlotRef,
    destination: SlotRef,
    creative: bool,
    pending_creative: &mut Option<ItemStack>,
    touched: &mut Vec<ContainerName>,
) -> SimResult<ActionResult> {
    let piece = if source.container == ContainerName::CreativeOutput {
        let Some(pending) = pending_creative.take() else {
            return Ok(Err(TransactionError::MissingCreativeItem));
        };
        pending
    } else {
        match remove_from(views, count, source, creative, touched)? {
            Ok(stack) => stack,
            Err(error) => return Ok(Err(error)),
        }
    };

    match deposit_into(views, piece, destination, touched)? {
        Ok(()) => Ok(Ok(())),
        Err((piece, error)) => {
            // Failed deposits put the stack back where it came from
            restore_to(views, piece, source)?;
            Ok(Err(error))
        }
    }
}

/// Split `count` off the stack at `source`, enforcing the client-declared
/// count against server state.
fn remove_from(
    views: &mut ContainerViews<'_>,
    count: i32,
    source: SlotRef,
    creative: bool,
    touched: &mut Vec<ContainerName>,
) -> SimResult<Result<ItemStack, TransactionError>> {
    let container = match resolve(views, source.container) {
        Ok(container) => container,
        Err(error) => return Ok(Err(error)),
    };
    if source.slot as usize >= container.size() {
        return Ok(Err(TransactionError::SlotOutOfRange {
            container: source.container,
            slot: source.slot,
        }));
    }

    let available = match container.get_item(source.slot as usize)? {
        Some(stack) => stack.amount(),
        None => return Ok(Err(TransactionError::EmptySource)),
    };

    if count > available {
        if creative {
            // Creative clients may take more than is present; inflate first
            if let Some(stack) = container.get_item_mut(source.slot as usize)? {
                stack.set_amount(count);
            }
        } else {
            return Err(SimError::ProtocolViolation {
                message: format!(
                    "requested {} items from a stack of {}",
                    count, available
                ),
            });
        }
    }

    let taken = container.take_item(source.slot as usize, count)?;
    note_touched(touched, source.container);
    match taken {
        Some(stack) => Ok(Ok(stack)),
        None => Ok(Err(TransactionError::EmptySource)),
    }
}

/// Land a stack in the destination slot, merging into a compatible stack
/// or filling an empty one. On failure the stack is handed back.
fn deposit_into(
    views: &mut ContainerViews<'_>,
    piece: ItemStack,
    destination: SlotRef,
    touched: &mut Vec<ContainerName>,
) -> SimResult<Result<(), (ItemStack, TransactionError)>> {
    let container = match resolve(views, destination.container) {
        Ok(container) => container,
        Err(error) => return Ok(Err((piece, error))),
    };
    if destination.slot as usize >= container.size() {
        return Ok(Err((
            piece,
            TransactionError::SlotOutOfRange {
                container: destination.container,
                slot: destination.slot,
            },
        )));
    }

    let slot = destination.slot as usize;
    match container.get_item_mut(slot)? {
        None => {
            container.set_item(slot, piece)?;
        }
        Some(existing) => {
            if !existing.can_merge(&piece) || existing.room_left() < piece.amount() {
                return Ok(Err((piece, TransactionError::IncompatibleDestination)));
            }
            existing.set_amount(existing.amount() + piece.amount());
        }
    }
    note_touched(touched, destination.container);
    Ok(Ok(()))
}

/// Return a stack to its source after a failed move
fn restore_to(
    views: &mut ContainerViews<'_>,
    piece: ItemStack,
    source: SlotRef,
) -> SimResult<()> {
    if source.container == ContainerName::CreativeOutput {
        // Synthesized stacks have no slot to return to
        return Ok(());
    }
    let Ok(container) = resolve(views, source.container) else {
        return Ok(());
    };
    let slot = source.slot as usize;
    if slot >= container.size() {
        return Ok(());
    }
    match container.get_item_mut(slot)? {
        Some(existing) if existing.can_merge(&piece) => {
            let amount = existing.amount() + piece.amount();
            existing.set_amount(amount);
        }
        None => {
            container.set_item(slot, piece)?;
        }
        Some(_) => {
            // Source changed underneath us; fall back to any free space
            container.add_item(piece);
        }
    }
    Ok(())
}

fn swap_slots(
    views: &mut ContainerViews<'_>,
    source: SlotRef,
    destination: SlotRef,
    touched: &mut Vec<ContainerName>,
) -> SimResult<ActionResult> {
    for slot_ref in [source, destination] {
        let container = match resolve(views, slot_ref.container) {
            Ok(container) => container,
            Err(error) => return Ok(Err(error)),
        };
        if slot_ref.slot as usize >= container.size() {
            return Ok(Err(TransactionError::SlotOutOfRange {
                container: slot_ref.container,
                slot: slot_ref.slot,
            }));
        }
    }

    let from_source = resolve_ok(views, source.container).clear_slot(source.slot as usize)?;
    let from_destination =
        resolve_ok(views, destination.container).clear_slot(destination.slot as usize)?;
    if let Some(stack) = from_source {
        resolve_ok(views, destination.container).set_item(destination.slot as usize, stack)?;
    }
    if let Some(stack) = from_destination {
        resolve_ok(views, source.container).set_item(source.slot as usize, stack)?;
    }
    note_touched(touched, source.container);
    note_touched(touched, destination.container);
    Ok(Ok(()))
}

fn resolve<'v>(
    views: &'v mut ContainerViews<'_>,
    name: ContainerName,
) -> Result<&'v mut Container, TransactionError> {
    match name {
        ContainerName::Cursor => Ok(views.cursor),
        ContainerName::Hotbar
        | ContainerName::Inventory
        | ContainerName::HotbarAndInventory => Ok(views.inventory),
        ContainerName::Armor => Ok(views.armor),
        ContainerName::CraftingInput => Ok(views.crafting_input),
        ContainerName::Opened => views
            .opened
            .as_deref_mut()
            .ok_or(TransactionError::InaccessibleContainer(name)),
        ContainerName::CreativeOutput => {
            Err(TransactionError::InaccessibleContainer(name))
        }
    }
}

/// Resolve a name already validated by an earlier resolve in this action
fn resolve_ok<'v>(views: &'v mut ContainerViews<'_>, name: ContainerName) -> &'v mut Container {
    match name {
        ContainerName::Cursor => views.cursor,
        ContainerName::Hotbar
        | ContainerName::Inventory
        | ContainerName::HotbarAndInventory => views.inventory,
        ContainerName::Armor => views.armor,
        ContainerName::CraftingInput => views.crafting_input,
        _ => match views.opened.as_deref_mut() {
            Some(container) => container,
            None => views.cursor,
        },
    }
}

fn note_touched(touched: &mut Vec<ContainerName>, name: ContainerName) {
    if name == ContainerName::CreativeOutput {
        return;
    }
    if !touched.contains(&name) {
        touched.push(name);
    }
}

fn snapshot_containers(
    views: &ContainerViews<'_>,
    touched: &[ContainerName],
) -> Vec<ContainerSnapshot> {
    touched
        .iter()
        .map(|&name| {
            let container = match name {
                ContainerName::Cursor => &*views.cursor,
                ContainerName::Hotbar
                | ContainerName::Inventory
                | ContainerName::HotbarAndInventory => &*views.inventory,
                ContainerName::Armor => &*views.armor,
                ContainerName::CraftingInput => &*views.crafting_input,
                _ => match views.opened.as_deref() {
                    Some(container) => container,
                    None => &*views.cursor,
                },
            };
            ContainerSnapshot {
                container: name,
                slots: container
                    .iter()
                    .filter_map(|(slot, stack)| {
                        stack.map(|stack| SlotInfo {
                            slot: slot as u8,
                            count: stack.amount(),
                            network_id: stack.network_id(),
                        })
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{
        ContainerLabel, ARMOR_SIZE, CRAFTING_INPUT_SIZE, CURSOR_SIZE, PLAYER_INVENTORY_SIZE,
    };

    struct Harness {
        cursor: Container,
        inventory: Container,
        armor: Container,
        crafting_input: Container,
        opened: Option<Container>,
        items: TypeRegistry<ItemType>,
    }

    impl Harness {
        fn new() -> Self {
            let mut items = TypeRegistry::new();
            items.register(ItemType::new("minecraft:dirt", 3).with_block("minecraft:dirt"));
            items.register(ItemType::new("minecraft:apple", 260));
            items.register(ItemType::new("minecraft:iron_pickaxe", 257).with_max_stack_size(1));
            Self {
                cursor: Container::new(ContainerLabel::Cursor, CURSOR_SIZE),
                inventory: Container::new(ContainerLabel::Inventory, PLAYER_INVENTORY_SIZE),
                armor: Container::new(ContainerLabel::Armor, ARMOR_SIZE),
                crafting_input: Container::new(ContainerLabel::CraftingInput, CRAFTING_INPUT_SIZE),
                opened: None,
                items,
            }
        }

        fn stack(&self, identifier: &str, amount: i32) -> ItemStack {
            ItemStack::new(self.items.get(identifier).expect("registered"), amount)
        }

        fn run(&mut self, requests: &[StackRequest], creative: bool) -> SimResult<TransactionOutcome> {
            let mut views = ContainerViews {
                cursor: &mut self.cursor,
                inventory: &mut self.inventory,
                armor: &mut self.armor,
                crafting_input: &mut self.crafting_input,
                opened: self.opened.as_mut(),
            };
            process_requests(&mut views, requests, &self.items, creative)
        }
    }

    fn place(count: u8, source: SlotRef, destination: SlotRef) -> RequestAction {
        RequestAction::Place {
            count,
            source,
            destination,
        }
    }

    #[test]
    fn test_place_moves_part_of_cursor_stack() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 10);
        harness.cursor.set_item(0, dirt).expect("in range");

        let request = StackRequest {
            request_id: -3,
            actions: vec![place(
                5,
                SlotRef::new(ContainerName::Cursor, 0),
                SlotRef::new(ContainerName::HotbarAndInventory, 9),
            )],
        };
        let outcome = harness.run(&[request], false).expect("no violation");

        assert_eq!(outcome.responses.len(), 1);
        let response = &outcome.responses[0];
        assert_eq!(response.request_id, -3);
        assert_eq!(response.status, ResponseStatus::Ok);

        assert_eq!(
            harness
                .cursor
                .get_item(0)
                .expect("in range")
                .map(ItemStack::amount),
            Some(5)
        );
        assert_eq!(
            harness
                .inventory
                .get_item(9)
                .expect("in range")
                .map(ItemStack::amount),
            Some(5)
        );

        let names: Vec<ContainerName> =
            response.containers.iter().map(|c| c.container).collect();
        assert!(names.contains(&ContainerName::Cursor));
        assert!(names.contains(&ContainerName::HotbarAndInventory));
    }

    #[test]
    fn test_count_mismatch_is_protocol_violation() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 3);
        harness.cursor.set_item(0, dirt).expect("in range");

        let request = StackRequest {
            request_id: -5,
            actions: vec![place(
                10,
                SlotRef::new(ContainerName::Cursor, 0),
                SlotRef::new(ContainerName::Inventory, 0),
            )],
        };
        let result = harness.run(&[request], false);
        assert!(matches!(result, Err(SimError::ProtocolViolation { .. })));
    }

    #[test]
    fn test_creative_inflates_undersized_source() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 1);
        harness.cursor.set_item(0, dirt).expect("in range");

        let request = StackRequest {
            request_id: -7,
            actions: vec![place(
                64,
                SlotRef::new(ContainerName::Cursor, 0),
                SlotRef::new(ContainerName::Inventory, 4),
            )],
        };
        let outcome = harness.run(&[request], true).expect("creative path");
        assert_eq!(outcome.responses[0].status, ResponseStatus::Ok);
        assert_eq!(
            harness
                .inventory
                .get_item(4)
                .expect("in range")
                .map(ItemStack::amount),
            Some(64)
        );
    }

    #[test]
    fn test_empty_source_errors_but_later_actions_apply() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 20);
        harness.inventory.set_item(0, dirt).expect("in range");

        let request = StackRequest {
            request_id: -9,
            actions: vec![
                place(
                    5,
                    SlotRef::new(ContainerName::Inventory, 0),
                    SlotRef::new(ContainerName::Inventory, 10),
                ),
                // slot 20 is empty
                place(
                    1,
                    SlotRef::new(ContainerName::Inventory, 20),
                    SlotRef::new(ContainerName::Inventory, 21),
                ),
                place(
                    5,
                    SlotRef::new(ContainerName::Inventory, 0),
                    SlotRef::new(ContainerName::Inventory, 11),
                ),
            ],
        };
        let outcome = harness.run(&[request], false).expect("no violation");

        assert!(matches!(
            outcome.responses[0].status,
            ResponseStatus::Error {
                cause: TransactionError::EmptySource
            }
        ));
        assert_eq!(
            harness
                .inventory
                .get_item(10)
                .expect("in range")
                .map(ItemStack::amount),
            Some(5)
        );
        assert_eq!(
            harness
                .inventory
                .get_item(11)
                .expect("in range")
                .map(ItemStack::amount),
            Some(5)
        );
        assert_eq!(
            harness
                .inventory
                .get_item(0)
                .expect("in range")
                .map(ItemStack::amount),
            Some(10)
        );
    }

    #[test]
    fn test_craft_creative_synthesizes_stack() {
        let mut harness = Harness::new();
        let request = StackRequest {
            request_id: -11,
            actions: vec![
                RequestAction::CraftCreative {
                    network_id: 3,
                    count: 64,
                },
                RequestAction::Take {
                    count: 64,
                    source: SlotRef::new(ContainerName::CreativeOutput, 50),
                    destination: SlotRef::new(ContainerName::Inventory, 0),
                },
            ],
        };
        let outcome = harness.run(&[request], true).expect("creative path");
        assert_eq!(outcome.responses[0].status, ResponseStatus::Ok);
        let stack = harness
            .inventory
            .get_item(0)
            .expect("in range")
            .expect("crafted");
        assert_eq!(stack.identifier(), "minecraft:dirt");
        assert_eq!(stack.amount(), 64);
    }

    #[test]
    fn test_craft_creative_unknown_id_fails_without_mutation() {
        let mut harness = Harness::new();
        let request = StackRequest {
            request_id: -13,
            actions: vec![
                RequestAction::CraftCreative {
                    network_id: 99999,
                    count: 1,
                },
                RequestAction::Take {
                    count: 1,
                    source: SlotRef::new(ContainerName::CreativeOutput, 50),
                    destination: SlotRef::new(ContainerName::Inventory, 0),
                },
            ],
        };
        let outcome = harness.run(&[request], true).expect("no violation");

        let response = &outcome.responses[0];
        assert_eq!(response.request_id, -13);
        assert!(matches!(
            response.status,
            ResponseStatus::Error {
                cause: TransactionError::UnknownCreativeItem(99999)
            }
        ));
        assert!(harness.inventory.is_empty());
    }

    #[test]
    fn test_craft_creative_rejects_oversized_count() {
        let mut harness = Harness::new();
        let request = StackRequest {
            request_id: -15,
            actions: vec![RequestAction::CraftCreative {
                // iron pickaxe stacks to 1
                network_id: 257,
                count: 5,
            }],
        };
        let outcome = harness.run(&[request], true).expect("no violation");
        assert!(matches!(
            outcome.responses[0].status,
            ResponseStatus::Error {
                cause: TransactionError::CountExceedsLimit { count: 5, max: 1 }
            }
        ));
        assert!(harness.inventory.is_empty());
    }

    #[test]
    fn test_craft_creative_requires_creative_mode() {
        let mut harness = Harness::new();
        let request = StackRequest {
            request_id: -17,
            actions: vec![RequestAction::CraftCreative {
                network_id: 3,
                count: 1,
            }],
        };
        let outcome = harness.run(&[request], false).expect("no violation");
        assert!(matches!(
            outcome.responses[0].status,
            ResponseStatus::Error {
                cause: TransactionError::RequiresCreative
            }
        ));
    }

    #[test]
    fn test_destroy_clears_slot_in_survival() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 30);
        harness.inventory.set_item(0, dirt).expect("in range");

        let destroy = StackRequest {
            request_id: -19,
            actions: vec![RequestAction::Destroy {
                count: 30,
                source: SlotRef::new(ContainerName::Inventory, 0),
            }],
        };
        let outcome = harness.run(&[destroy], false).expect("no violation");
        assert_eq!(outcome.responses[0].status, ResponseStatus::Ok);
        assert!(harness.inventory.is_empty());
    }

    #[test]
    fn test_destroy_partial_leaves_remainder() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 30);
        harness.inventory.set_item(0, dirt).expect("in range");

        let destroy = StackRequest {
            request_id: -23,
            actions: vec![RequestAction::Destroy {
                count: 10,
                source: SlotRef::new(ContainerName::Inventory, 0),
            }],
        };
        let outcome = harness.run(&[destroy], false).expect("no violation");
        assert_eq!(outcome.responses[0].status, ResponseStatus::Ok);
        let remaining = harness
            .inventory
            .get_item(0)
            .expect("in range")
            .expect("stack survives");
        assert_eq!(remaining.amount(), 20);
    }

    #[test]
    fn test_swap_exchanges_cursor_and_inventory() {
        let mut harness = Harness::new();
        let pickaxe = harness.stack("minecraft:iron_pickaxe", 1);
        let apple = harness.stack("minecraft:apple", 7);
        harness.cursor.set_item(0, pickaxe).expect("in range");
        harness.inventory.set_item(3, apple).expect("in range");

        let request = StackRequest {
            request_id: -21,
            actions: vec![RequestAction::Swap {
                source: SlotRef::new(ContainerName::Cursor, 0),
                destination: SlotRef::new(ContainerName::Inventory, 3),
            }],
        };
        let outcome = harness.run(&[request], false).expect("no violation");
        assert_eq!(outcome.responses[0].status, ResponseStatus::Ok);
        assert_eq!(
            harness
                .cursor
                .get_item(0)
                .expect("in range")
                .map(ItemStack::identifier),
            Some("minecraft:apple")
        );
        assert_eq!(
            harness
                .inventory
                .get_item(3)
                .expect("in range")
                .map(ItemStack::identifier),
            Some("minecraft:iron_pickaxe")
        );
    }

    #[test]
    fn test_drop_returns_stacks_for_the_world() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 10);
        harness.inventory.set_item(0, dirt).expect("in range");

        let request = StackRequest {
            request_id: -23,
            actions: vec![RequestAction::Drop {
                count: 4,
                source: SlotRef::new(ContainerName::Inventory, 0),
                randomly: false,
            }],
        };
        let outcome = harness.run(&[request], false).expect("no violation");
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].stack.amount(), 4);
        assert_eq!(
            harness
                .inventory
                .get_item(0)
                .expect("in range")
                .map(ItemStack::amount),
            Some(6)
        );
    }

    #[test]
    fn test_incompatible_destination_restores_source() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 10);
        let apple = harness.stack("minecraft:apple", 5);
        harness.cursor.set_item(0, dirt).expect("in range");
        harness.inventory.set_item(0, apple).expect("in range");

        let request = StackRequest {
            request_id: -25,
            actions: vec![place(
                10,
                SlotRef::new(ContainerName::Cursor, 0),
                SlotRef::new(ContainerName::Inventory, 0),
            )],
        };
        let outcome = harness.run(&[request], false).expect("no violation");
        assert!(matches!(
            outcome.responses[0].status,
            ResponseStatus::Error {
                cause: TransactionError::IncompatibleDestination
            }
        ));
        // The moved stack went back to the cursor
        assert_eq!(
            harness
                .cursor
                .get_item(0)
                .expect("in range")
                .map(ItemStack::amount),
            Some(10)
        );
    }

    #[test]
    fn test_opened_container_requires_open_state() {
        let mut harness = Harness::new();
        let dirt = harness.stack("minecraft:dirt", 10);
        harness.cursor.set_item(0, dirt).expect("in range");

        let request = StackRequest {
            request_id: -27,
            actions: vec![place(
                5,
                SlotRef::new(ContainerName::Cursor, 0),
                SlotRef::new(ContainerName::Opened, 0),
            )],
        };
        let outcome = harness.run(&[request], false).expect("no violation");
        assert!(matches!(
            outcome.responses[0].status,
            ResponseStatus::Error {
                cause: TransactionError::InaccessibleContainer(ContainerName::Opened)
            }
        ));
    }
}
