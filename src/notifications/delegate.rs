/// Receives lifecycle callbacks for one notification.
///
/// Callbacks are fire-and-forget and may arrive on OS-owned threads. They are
/// never invoked while presenter locks are held, so implementations are free
/// to call back into the presenter.
pub trait NotificationDelegate: Send + Sync {
    fn notification_click(&self);

    /// `index` is the position of the pressed button in the options' `actions`.
    fn notification_action(&self, index: usize);

    fn notification_dismissed(&self);

    /// `error` is best-effort platform detail and may be empty.
    fn notification_failed(&self, error: &str);
}
