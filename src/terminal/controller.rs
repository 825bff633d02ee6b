use crate::domain::{Decimal, InstrumentId, Order, OrderId, TransferRecord};
use crate::engine::TickReport;
use crate::error::CommandError;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{PlaceOrder, Simulator};

const COMMAND_BUFFER: usize = 256;

type Reply<T> = oneshot::Sender<Result<T, CommandError>>;
type ReadFn = Box<dyn FnOnce(&Simulator) + Send>;

/// Commands sent from handles to the terminal loop.
pub enum TerminalCommand {
    PlaceOrder {
        request: PlaceOrder,
        resp: Reply<Order>,
    },
    CancelOrder {
        id: OrderId,
        resp: Reply<Order>,
    },
    MoveStopToEntry {
        id: OrderId,
        resp: Reply<Order>,
    },
    Deposit {
        amount: Decimal,
        method: String,
        resp: Reply<TransferRecord>,
    },
    Withdraw {
        amount: Decimal,
        method: String,
        resp: Reply<TransferRecord>,
    },
    SetPrice {
        id: InstrumentId,
        price: Decimal,
        resp: Reply<()>,
    },
    /// Run one tick out of schedule.
    Tick { resp: oneshot::Sender<TickReport> },
    /// Evaluate orders at current prices.
    Evaluate { resp: oneshot::Sender<TickReport> },
    /// Run a read-only closure against the simulator.
    Read(ReadFn),
}

impl std::fmt::Debug for TerminalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TerminalCommand::PlaceOrder { .. } => "PlaceOrder",
            TerminalCommand::CancelOrder { .. } => "CancelOrder",
            TerminalCommand::MoveStopToEntry { .. } => "MoveStopToEntry",
            TerminalCommand::Deposit { .. } => "Deposit",
            TerminalCommand::Withdraw { .. } => "Withdraw",
            TerminalCommand::SetPrice { .. } => "SetPrice",
            TerminalCommand::Tick { .. } => "Tick",
            TerminalCommand::Evaluate { .. } => "Evaluate",
            TerminalCommand::Read(_) => "Read",
        };
        f.write_str(name)
    }
}

/// Cloneable front door to the terminal loop.
#[derive(Debug, Clone)]
pub struct TerminalHandle {
    tx: mpsc::Sender<TerminalCommand>,
}

impl TerminalHandle {
    async fn send(&self, cmd: TerminalCommand) -> Result<(), CommandError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| CommandError::TerminalUnavailable)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> TerminalCommand,
    ) -> Result<T, CommandError> {
        let (resp, rx) = oneshot::channel();
        self.send(build(resp)).await?;
        rx.await.map_err(|_| CommandError::TerminalUnavailable)?
    }

    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, CommandError> {
        self.request(|resp| TerminalCommand::PlaceOrder { request, resp })
            .await
    }

    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, CommandError> {
        self.request(|resp| TerminalCommand::CancelOrder { id, resp })
            .await
    }

    pub async fn move_stop_to_entry(&self, id: OrderId) -> Result<Order, CommandError> {
        self.request(|resp| TerminalCommand::MoveStopToEntry { id, resp })
            .await
    }

    pub async fn deposit(
        &self,
        amount: Decimal,
        method: String,
    ) -> Result<TransferRecord, CommandError> {
        self.request(|resp| TerminalCommand::Deposit {
            amount,
            method,
            resp,
        })
        .await
    }

    pub async fn withdraw(
        &self,
        amount: Decimal,
        method: String,
    ) -> Result<TransferRecord, CommandError> {
        self.request(|resp| TerminalCommand::Withdraw {
            amount,
            method,
            resp,
        })
        .await
    }

    pub async fn set_price(&self, id: InstrumentId, price: Decimal) -> Result<(), CommandError> {
        self.request(|resp| TerminalCommand::SetPrice { id, price, resp })
            .await
    }

    pub async fn tick(&self) -> Result<TickReport, CommandError> {
        let (resp, rx) = oneshot::channel();
        self.send(TerminalCommand::Tick { resp }).await?;
        rx.await.map_err(|_| CommandError::TerminalUnavailable)
    }

    pub async fn evaluate(&self) -> Result<TickReport, CommandError> {
        let (resp, rx) = oneshot::channel();
        self.send(TerminalCommand::Evaluate { resp }).await?;
        rx.await.map_err(|_| CommandError::TerminalUnavailable)
    }

    /// Take a consistent snapshot between ticks.
    pub async fn read<R, F>(&self, f: F) -> Result<R, CommandError>
    where
        R: Send + 'static,
        F: FnOnce(&Simulator) -> R + Send + 'static,
    {
        let (resp, rx) = oneshot::channel();
        self.send(TerminalCommand::Read(Box::new(move |sim| {
            let _ = resp.send(f(sim));
        })))
        .await?;
        rx.await.map_err(|_| CommandError::TerminalUnavailable)
    }
}

/// Owns the running loop; resolving `shutdown` hands the simulator back.
#[derive(Debug)]
pub struct TerminalTask {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<Simulator>,
}

impl TerminalTask {
    /// Stop the loop. No tick runs after this resolves.
    pub async fn shutdown(self) -> Result<Simulator, JoinError> {
        let _ = self.shutdown_tx.send(());
        self.join.await
    }
}

pub struct TerminalController;

impl TerminalController {
    /// Move `sim` into its own task, ticking every `period`.
    ///
    /// The first scheduled tick fires one full period after spawn.
    pub fn spawn(sim: Simulator, period: Duration) -> (TerminalHandle, TerminalTask) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(run(sim, rx, shutdown_rx, period));
        (TerminalHandle { tx }, TerminalTask { shutdown_tx, join })
    }
}

async fn run(
    mut sim: Simulator,
    mut rx: mpsc::Receiver<TerminalCommand>,
    mut shutdown_rx: oneshot::Receiver<()>,
    period: Duration,
) -> Simulator {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Terminal running, tick every {:?}", period);

    loop {
        tokio::select! {
            biased;

            // A dropped task handle also stops the loop.
            _ = &mut shutdown_rx => {
                info!("Terminal shutting down after {} ticks", sim.ticks());
                break;
            }

            cmd = rx.recv() => match cmd {
                Some(cmd) => handle_cmd(&mut sim, cmd),
                None => {
                    info!("All terminal handles dropped, stopping");
                    break;
                }
            },

            _ = ticker.tick() => {
                let report = sim.tick();
                if report.is_empty() {
                    debug!(tick = sim.ticks(), "Tick");
                } else {
                    info!(
                        tick = sim.ticks(),
                        fills = report.fills(),
                        closures = report.closures(),
                        events = report.events.len(),
                        "Tick produced order events"
                    );
                }
            }
        }
    }

    sim
}

fn handle_cmd(sim: &mut Simulator, cmd: TerminalCommand) {
    debug!(command = ?cmd, "Terminal command");
    // A closed reply channel only means the caller went away.
    match cmd {
        TerminalCommand::PlaceOrder { request, resp } => {
            let _ = resp.send(sim.place_order(request));
        }
        TerminalCommand::CancelOrder { id, resp } => {
            let _ = resp.send(sim.cancel_order(&id));
        }
        TerminalCommand::MoveStopToEntry { id, resp } => {
            let _ = resp.send(sim.move_stop_to_entry(&id));
        }
        TerminalCommand::Deposit {
            amount,
            method,
            resp,
        } => {
            let _ = resp.send(sim.deposit(amount, &method));
        }
        TerminalCommand::Withdraw {
            amount,
            method,
            resp,
        } => {
            let _ = resp.send(sim.withdraw(amount, &method));
        }
        TerminalCommand::SetPrice { id, price, resp } => {
            let _ = resp.send(sim.set_price(&id, price));
        }
        TerminalCommand::Tick { resp } => {
            let _ = resp.send(sim.tick());
        }
        TerminalCommand::Evaluate { resp } => {
            let _ = resp.send(sim.evaluate());
        }
        TerminalCommand::Read(f) => f(sim),
    }
}
