/// Runs a callback when dropped.
///
/// `main` uses it to restore the terminal: the callback runs on a normal
/// return, on an early `?` return, and while unwinding from a panic.
///
/// # Examples
///
/// ```
/// use rusty_ide::utils::guard::OnExit;
///
/// let mut restored = false;
/// {
///     let _guard = OnExit::new(|| restored = true);
/// }
/// assert!(restored);
/// ```
#[must_use = "the callback runs as soon as the guard is dropped"]
pub struct OnExit<F: FnOnce()> {
    on_exit: Option<F>,
}

impl<F: FnOnce()> OnExit<F> {
    pub fn new(f: F) -> Self {
        Self { on_exit: Some(f) }
    }
}

impl<F: FnOnce()> Drop for OnExit<F> {
    fn drop(&mut self) {
        if let Some(f) = self.on_exit.take() {
            f()
        }
    }
}
