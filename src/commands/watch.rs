//! Watch command - stream change notifications until Ctrl+C

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use devstate::{Category, StateError, StateMonitor};
use devstate_transport::Transport;

pub async fn watch(
    transport: Arc<dyn Transport>,
    categories: Vec<Category>,
) -> Result<(), StateError> {
    let categories = if categories.is_empty() {
        Category::ALL.to_vec()
    } else {
        categories
    };

    let monitor = Arc::new(StateMonitor::new(transport));
    let dispatcher = monitor.spawn_dispatcher();

    // Set up Ctrl-C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    // Current values first, then the change stream.
    for &category in &categories {
        println!("{category}: {}", monitor.query(category).await);
    }

    let mut printers = Vec::new();
    for &category in &categories {
        let mut observer = monitor.register(category).await?;
        info!(%category, "watching");
        printers.push(tokio::spawn(async move {
            while let Some(change) = observer.recv().await {
                println!("{}: {change}", change.category());
            }
        }));
    }

    println!("Watching. Ctrl+C to stop.");
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    // Teardown releases every transport subscription; the printer tasks
    // end once their senders are gone.
    monitor.shutdown().await?;
    for printer in printers {
        let _ = printer.await;
    }
    dispatcher.abort();
    Ok(())
}
