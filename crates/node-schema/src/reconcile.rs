//! Socket reconciliation
//!
//! Brings one direction of a node instance's sockets in line with its schema.
//! For each socket parameter `p_i` in schema order, the first socket at or
//! after position `i` with the same identifier is refreshed in place and moved
//! to `i`; if there is none, a new socket is created at `i`. Whatever is left
//! after the last parameter is removed.
//!
//! Refreshing in place keeps the socket's uid and links, so connections
//! survive schema changes for every identifier that is still declared. A
//! second call with an unchanged schema makes no changes.

use crate::parameter::Direction;
use crate::schema::NodeSchema;
use crate::socket::{Socket, SocketId, SocketList};

/// Changes made to the sockets of one direction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionReport {
    pub created: Vec<SocketId>,
    pub refreshed: Vec<SocketId>,
    pub moved: Vec<SocketId>,
    /// Removed sockets, with the links they still held
    pub removed: Vec<Socket>,
}

impl DirectionReport {
    pub fn mutation_count(&self) -> usize {
        self.created.len() + self.refreshed.len() + self.moved.len() + self.removed.len()
    }

    pub fn is_noop(&self) -> bool {
        self.mutation_count() == 0
    }
}

/// Changes made by reconciling one node instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub inputs: DirectionReport,
    pub outputs: DirectionReport,
    /// Live values inserted or reset to their default
    pub values_added: Vec<String>,
    /// Live values of parameters no longer in the schema
    pub values_dropped: Vec<String>,
}

impl ReconcileReport {
    pub fn direction(&self, direction: Direction) -> &DirectionReport {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub fn mutation_count(&self) -> usize {
        self.inputs.mutation_count()
            + self.outputs.mutation_count()
            + self.values_added.len()
            + self.values_dropped.len()
    }

    pub fn is_noop(&self) -> bool {
        self.mutation_count() == 0
    }

    /// Every removed socket of both directions
    pub fn removed_sockets(&self) -> impl Iterator<Item = &Socket> {
        self.inputs.removed.iter().chain(self.outputs.removed.iter())
    }
}

/// Reconcile the sockets of one direction against `schema`.
///
/// New sockets take uids from `next_uid`.
pub fn reconcile_direction(
    schema: &NodeSchema,
    direction: Direction,
    sockets: &mut SocketList,
    next_uid: &mut u64,
) -> DirectionReport {
    let mut report = DirectionReport::default();
    let mut count = 0;

    for (i, spec) in schema.socket_parameters(direction).enumerate() {
        match sockets.position_from(i, spec.identifier()) {
            Some(pos) => {
                let socket = &mut sockets[pos];
                if spec.verify_socket(socket) {
                    report.refreshed.push(socket.uid());
                }
                if pos != i {
                    report.moved.push(socket.uid());
                    sockets.move_to(pos, i);
                }
            }
            None => {
                let uid = SocketId(*next_uid);
                *next_uid += 1;
                let pos = sockets.push(spec.make_socket(uid));
                sockets.move_to(pos, i);
                report.created.push(uid);
            }
        }
        count = i + 1;
    }

    report.removed = sockets.truncate_from(count);
    report
}
