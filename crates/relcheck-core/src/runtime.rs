use std::future::Future;

pub(crate) fn current_thread_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Drive `future` to completion on a fresh runtime owned by a scoped thread,
/// so callers may block here whether or not they are inside a runtime.
///
/// Returns `None` when the runtime cannot be started or the thread panics.
pub(crate) fn block_on_dedicated<F>(future: F) -> Option<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    std::thread::scope(|scope| {
        scope
            .spawn(|| {
                let runtime = current_thread_runtime().ok()?;
                Some(runtime.block_on(future))
            })
            .join()
            .ok()
            .flatten()
    })
}

#[cfg(test)]
mod tests {
    use super::block_on_dedicated;

    #[test]
    fn runs_future_outside_a_runtime() {
        assert_eq!(block_on_dedicated(async { 40 + 2 }), Some(42));
    }

    #[tokio::test]
    async fn runs_future_from_inside_a_runtime() {
        let value = block_on_dedicated(async {
            tokio::task::yield_now().await;
            "done"
        });
        assert_eq!(value, Some("done"));
    }
}
