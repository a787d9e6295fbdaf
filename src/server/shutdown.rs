use tokio::sync::{broadcast, mpsc, Mutex, RwLock};

// Notifier lets the listener and the session tasks know that the server
// is stopping.
#[derive(Debug)]
pub struct Notifier {
    shutdown_tx: RwLock<Option<broadcast::Sender<()>>>,
    shutdown_complete_tx: RwLock<Option<mpsc::Sender<()>>>,
    shutdown_complete_rx: Mutex<mpsc::Receiver<()>>,
}

impl Notifier {
    pub fn new() -> Notifier {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (shutdown_complete_tx, shutdown_complete_rx) = mpsc::channel(1);
        Notifier {
            shutdown_tx: RwLock::new(Some(shutdown_tx)),
            shutdown_complete_tx: RwLock::new(Some(shutdown_complete_tx)),
            shutdown_complete_rx: Mutex::new(shutdown_complete_rx),
        }
    }

    // Tells all subscribed listeners that shutdown is commencing. They
    // signal completion by letting their Listener go out of scope.
    // Calling this more than once is harmless.
    pub async fn notify(&self) {
        // Dropping the sender wakes every subscribed receiver.
        drop(self.shutdown_tx.write().await.take());
        // Dropping our clone of the completion sender lets linger() see
        // the channel close once the last task is gone.
        drop(self.shutdown_complete_tx.write().await.take())
    }

    // Waits for the tasks holding shutdown listeners to finish.
    pub async fn linger(&self) {
        let _ = self.shutdown_complete_rx.lock().await.recv().await;
    }

    pub async fn subscribe(&self) -> Listener {
        let sender_opt = self.shutdown_tx.read().await;
        let complete_sender_opt = self.shutdown_complete_tx.read().await;
        Listener {
            shutdown: sender_opt.is_none(),
            shutdown_rx: sender_opt.as_ref().map(|tx| tx.subscribe()),
            shutdown_complete_tx: complete_sender_opt.clone(),
        }
    }
}

// Listener is held by a task that wants to be told about shutdown.
#[derive(Debug)]
pub struct Listener {
    shutdown: bool,
    shutdown_rx: Option<broadcast::Receiver<()>>,
    // Held only so linger() can detect when this task is done.
    #[allow(dead_code)]
    shutdown_complete_tx: Option<mpsc::Sender<()>>,
}

impl Listener {
    // Receive the shutdown notice, waiting if necessary.
    pub async fn listen(&mut self) {
        if self.shutdown {
            return;
        }
        match self.shutdown_rx.as_mut() {
            // The sender was dropped, which is exactly the signal.
            Some(rx) => {
                let _ = rx.recv().await;
            }
            None => {}
        }
        self.shutdown = true;
    }
}
