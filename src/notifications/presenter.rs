//! Notification registry and lifecycle transitions.
//!
//! The presenter is the only owner of live notifications. Every terminal OS
//! event (click, action, dismissal with destroy, failure) removes the
//! notification from the registry, so nothing lingers once the toast is gone
//! from the screen.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::delegate::NotificationDelegate;
use super::notification::{Notification, NotificationBackend, NotificationHandle, NotificationState};
use super::options::NotificationOptions;
use crate::error::{NotificationError, Result};

type BackendFactory = dyn Fn() -> Box<dyn NotificationBackend> + Send + Sync;

pub(crate) struct PresenterInner {
    notifications: Mutex<HashMap<NotificationHandle, Notification>>,
    next_handle: AtomicU64,
    backend_factory: Box<BackendFactory>,
    debug_notifications: AtomicBool,
}

/// What a transition does to the notification once the delegate is told.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Destroy,
    KeepDismissed,
}

#[derive(Clone)]
pub struct NotificationPresenter {
    inner: Arc<PresenterInner>,
}

impl NotificationPresenter {
    /// Creates a presenter that builds one backend per notification.
    pub fn new<F>(backend_factory: F) -> Self
    where
        F: Fn() -> Box<dyn NotificationBackend> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(PresenterInner {
                notifications: Mutex::new(HashMap::new()),
                next_handle: AtomicU64::new(1),
                backend_factory: Box::new(backend_factory),
                debug_notifications: AtomicBool::new(false),
            }),
        }
    }

    /// Log every option passed to `show`.
    pub fn with_debug_notifications(self, enabled: bool) -> Self {
        self.inner.debug_notifications.store(enabled, Ordering::Relaxed);
        self
    }

    /// Creates a notification bound to `delegate`. The presenter only keeps a
    /// weak reference; dropping the delegate silences its callbacks.
    pub fn create<D>(&self, delegate: &Arc<D>) -> NotificationHandle
    where
        D: NotificationDelegate + 'static,
    {
        let delegate: Arc<dyn NotificationDelegate> = delegate.clone();
        self.inner.insert(Some(Arc::downgrade(&delegate)))
    }

    /// Creates a notification with no delegate attached.
    pub fn create_detached(&self) -> NotificationHandle {
        self.inner.insert(None)
    }

    /// Displays the notification. Display errors are not returned: they go
    /// through the failure path and destroy the notification. Only an unknown
    /// handle or a second `show` is an error.
    pub fn show(&self, handle: NotificationHandle, options: NotificationOptions) -> Result<()> {
        self.inner.show(handle, options)
    }

    /// Requests removal from the screen. The OS reports the outcome through
    /// the dismissed transition. A backend that cannot hide a toast returns
    /// an error, and the notification stays live and unchanged.
    pub fn dismiss(&self, handle: NotificationHandle) -> Result<()> {
        let mut backend = self.inner.take_backend(handle, "dismiss")?;
        let result = backend.dismiss();
        self.inner.restore_backend(handle, backend);
        if let Err(ref e) = result {
            tracing::warn!("Failed to dismiss {}: {}", handle, e);
        }
        result
    }

    /// Second-phase cleanup after a dismissal. Destroys a notification that
    /// was dismissed without being destroyed; a no-op for handles that are
    /// already gone.
    pub fn remove(&self, handle: NotificationHandle) -> Result<()> {
        let mut backend = match self.inner.take_backend(handle, "remove") {
            Ok(backend) => backend,
            Err(NotificationError::NotFound(_)) => {
                tracing::debug!("remove() on {} after destruction, ignoring", handle);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        backend.remove();

        let mut notifications = self.inner.notifications.lock();
        let dismissed = match notifications.get(&handle) {
            Some(notification) => notification.is_dismissed,
            None => return Ok(()),
        };
        if dismissed {
            notifications.remove(&handle);
            tracing::debug!("Destroyed {} on remove", handle);
        } else if let Some(notification) = notifications.get_mut(&handle) {
            notification.backend = Some(backend);
        }
        Ok(())
    }

    /// Drops the notification without telling its delegate anything.
    pub fn close(&self, handle: NotificationHandle) -> bool {
        self.inner.destroy(handle)
    }

    pub fn notification_clicked(&self, handle: NotificationHandle) -> bool {
        self.inner.notification_clicked(handle)
    }

    pub fn notification_action_invoked(&self, handle: NotificationHandle, index: usize) -> bool {
        self.inner.notification_action_invoked(handle, index)
    }

    pub fn notification_dismissed(&self, handle: NotificationHandle, should_destroy: bool) -> bool {
        self.inner.notification_dismissed(handle, should_destroy)
    }

    pub fn notification_failed(&self, handle: NotificationHandle, error: &str) -> bool {
        self.inner.notification_failed(handle, error)
    }

    /// Liveness token for deferred and OS-thread callbacks.
    pub fn weak(&self, handle: NotificationHandle) -> WeakNotification {
        WeakNotification {
            presenter: Arc::downgrade(&self.inner),
            handle,
        }
    }

    pub fn set_delegate<D>(&self, handle: NotificationHandle, delegate: &Arc<D>) -> Result<()>
    where
        D: NotificationDelegate + 'static,
    {
        let delegate: Arc<dyn NotificationDelegate> = delegate.clone();
        self.inner
            .with_notification(handle, |n| n.delegate = Some(Arc::downgrade(&delegate)))
    }

    /// Detaches the delegate, e.g. when its owner is being torn down first.
    pub fn clear_delegate(&self, handle: NotificationHandle) -> Result<()> {
        self.inner.with_notification(handle, |n| n.delegate = None)
    }

    pub fn contains(&self, handle: NotificationHandle) -> bool {
        self.inner.notifications.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.inner.notifications.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notification_id(&self, handle: NotificationHandle) -> Option<String> {
        self.inner
            .notifications
            .lock()
            .get(&handle)
            .map(|n| n.notification_id.clone())
    }

    pub fn state(&self, handle: NotificationHandle) -> Option<NotificationState> {
        self.inner.notifications.lock().get(&handle).map(|n| n.state)
    }

    pub fn is_dismissed(&self, handle: NotificationHandle) -> Option<bool> {
        self.inner.notifications.lock().get(&handle).map(|n| n.is_dismissed)
    }

    /// The options a notification was shown with.
    pub fn options(&self, handle: NotificationHandle) -> Option<Arc<NotificationOptions>> {
        self.inner
            .notifications
            .lock()
            .get(&handle)
            .and_then(|n| n.options.clone())
    }

    /// Live notifications shown with the given tag, oldest first.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NotificationHandle> {
        if tag.is_empty() {
            return Vec::new();
        }
        let notifications = self.inner.notifications.lock();
        let mut handles: Vec<NotificationHandle> = notifications
            .iter()
            .filter(|(_, n)| n.options.as_ref().is_some_and(|o| o.tag == tag))
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }
}

impl PresenterInner {
    fn insert(&self, delegate: Option<Weak<dyn NotificationDelegate>>) -> NotificationHandle {
        let handle = NotificationHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let notification_id = uuid::Uuid::new_v4().to_string();
        let backend = (self.backend_factory)();

        tracing::debug!("Created {} ({})", handle, notification_id);
        self.notifications
            .lock()
            .insert(handle, Notification::new(notification_id, backend, delegate));
        handle
    }

    fn with_notification<T>(
        &self,
        handle: NotificationHandle,
        f: impl FnOnce(&mut Notification) -> T,
    ) -> Result<T> {
        let mut notifications = self.notifications.lock();
        let notification = notifications
            .get_mut(&handle)
            .ok_or(NotificationError::NotFound(handle))?;
        Ok(f(notification))
    }

    /// Takes the backend out so it can run without the registry lock held.
    fn take_backend(
        &self,
        handle: NotificationHandle,
        action: &'static str,
    ) -> Result<Box<dyn NotificationBackend>> {
        self.with_notification(handle, |n| n.backend.take())?
            .ok_or(NotificationError::InvalidTransition {
                handle,
                action,
                state: "busy",
            })
    }

    /// Puts the backend back, or drops it if the notification went away
    /// while the backend was running.
    fn restore_backend(&self, handle: NotificationHandle, backend: Box<dyn NotificationBackend>) {
        if let Some(notification) = self.notifications.lock().get_mut(&handle) {
            notification.backend = Some(backend);
        }
    }

    fn show(self: &Arc<Self>, handle: NotificationHandle, options: NotificationOptions) -> Result<()> {
        let options = Arc::new(options);
        let mut backend = {
            let mut notifications = self.notifications.lock();
            let notification = notifications
                .get_mut(&handle)
                .ok_or(NotificationError::NotFound(handle))?;
            if notification.state != NotificationState::Created {
                return Err(NotificationError::InvalidTransition {
                    handle,
                    action: "show",
                    state: notification.state.as_str(),
                });
            }
            let backend = notification.backend.take().ok_or(NotificationError::InvalidTransition {
                handle,
                action: "show",
                state: "busy",
            })?;
            // Shown before the backend runs so it may report events synchronously
            notification.state = NotificationState::Shown;
            notification.options = Some(options.clone());
            backend
        };

        if self.debug_notifications.load(Ordering::Relaxed) {
            tracing::debug!(
                "Showing {}: title={:?} body={:?} tag={:?} silent={} actions={} reply={} timeout={:?}",
                handle,
                options.title,
                options.body,
                options.tag,
                options.silent,
                options.actions.len(),
                options.has_reply,
                options.timeout_type
            );
        }

        let events = WeakNotification {
            presenter: Arc::downgrade(self),
            handle,
        };
        let result = options
            .validate()
            .and_then(|()| backend.show(&options, events));
        self.restore_backend(handle, backend);

        if let Err(e) = result {
            tracing::warn!("Failed to show {}: {}", handle, e);
            let detail = match e {
                NotificationError::Display(detail) => detail,
                other => other.to_string(),
            };
            self.notification_failed(handle, &detail);
        }
        Ok(())
    }

    /// Applies a transition under the lock and hands back the delegate to
    /// notify. `None` means the event was dropped.
    fn transition(
        &self,
        handle: NotificationHandle,
        action: &'static str,
        outcome: Outcome,
    ) -> Option<Option<Arc<dyn NotificationDelegate>>> {
        let mut notifications = self.notifications.lock();
        let Some(notification) = notifications.get_mut(&handle) else {
            tracing::debug!("Dropping {} for {}: already destroyed", action, handle);
            return None;
        };
        if notification.state != NotificationState::Shown {
            tracing::debug!(
                "Dropping {} for {}: notification is {}",
                action,
                handle,
                notification.state
            );
            return None;
        }

        let delegate = notification.delegate();
        match outcome {
            Outcome::Destroy => {
                notifications.remove(&handle);
                tracing::debug!("{} on {}, destroyed", action, handle);
            }
            Outcome::KeepDismissed => {
                notification.is_dismissed = true;
                notification.state = NotificationState::Dismissed;
                tracing::debug!("{} on {}, awaiting remove", action, handle);
            }
        }
        Some(delegate)
    }

    fn notification_clicked(&self, handle: NotificationHandle) -> bool {
        let Some(delegate) = self.transition(handle, "click", Outcome::Destroy) else {
            return false;
        };
        if let Some(delegate) = delegate {
            delegate.notification_click();
        }
        true
    }

    fn notification_action_invoked(&self, handle: NotificationHandle, index: usize) -> bool {
        let action_count = self
            .notifications
            .lock()
            .get(&handle)
            .and_then(|n| n.options.as_ref().map(|o| o.actions.len()));
        if let Some(count) = action_count {
            if index >= count {
                tracing::warn!(
                    "Ignoring action {} for {}: only {} actions were shown",
                    index,
                    handle,
                    count
                );
                return false;
            }
        }

        let Some(delegate) = self.transition(handle, "action", Outcome::Destroy) else {
            return false;
        };
        if let Some(delegate) = delegate {
            delegate.notification_action(index);
        }
        true
    }

    fn notification_dismissed(&self, handle: NotificationHandle, should_destroy: bool) -> bool {
        let outcome = if should_destroy {
            Outcome::Destroy
        } else {
            Outcome::KeepDismissed
        };
        let Some(delegate) = self.transition(handle, "dismiss", outcome) else {
            return false;
        };
        if let Some(delegate) = delegate {
            delegate.notification_dismissed();
        }
        true
    }

    fn notification_failed(&self, handle: NotificationHandle, error: &str) -> bool {
        let Some(delegate) = self.transition(handle, "failure", Outcome::Destroy) else {
            return false;
        };
        if let Some(delegate) = delegate {
            delegate.notification_failed(error);
        }
        true
    }

    fn destroy(&self, handle: NotificationHandle) -> bool {
        let removed = self.notifications.lock().remove(&handle).is_some();
        if removed {
            tracing::debug!("Closed {}", handle);
        }
        removed
    }
}

/// Weak reference to a notification, safe to hold across await points and
/// to move onto OS callback threads. Every method re-checks that the
/// notification still exists and quietly does nothing otherwise.
#[derive(Clone)]
pub struct WeakNotification {
    presenter: Weak<PresenterInner>,
    handle: NotificationHandle,
}

impl WeakNotification {
    pub fn handle(&self) -> NotificationHandle {
        self.handle
    }

    pub fn is_alive(&self) -> bool {
        self.presenter
            .upgrade()
            .is_some_and(|inner| inner.notifications.lock().contains_key(&self.handle))
    }

    pub fn presenter(&self) -> Option<NotificationPresenter> {
        self.presenter
            .upgrade()
            .map(|inner| NotificationPresenter { inner })
    }

    pub fn clicked(&self) -> bool {
        self.presenter
            .upgrade()
            .is_some_and(|inner| inner.notification_clicked(self.handle))
    }

    pub fn action_invoked(&self, index: usize) -> bool {
        self.presenter
            .upgrade()
            .is_some_and(|inner| inner.notification_action_invoked(self.handle, index))
    }

    pub fn dismissed(&self, should_destroy: bool) -> bool {
        self.presenter
            .upgrade()
            .is_some_and(|inner| inner.notification_dismissed(self.handle, should_destroy))
    }

    pub fn failed(&self, error: &str) -> bool {
        self.presenter
            .upgrade()
            .is_some_and(|inner| inner.notification_failed(self.handle, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::options::NotificationAction;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Click,
        Action(usize),
        Dismissed,
        Failed(String),
    }

    #[derive(Default)]
    struct RecordingDelegate {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingDelegate {
        fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    impl NotificationDelegate for RecordingDelegate {
        fn notification_click(&self) {
            self.events.lock().push(Event::Click);
        }

        fn notification_action(&self, index: usize) {
            self.events.lock().push(Event::Action(index));
        }

        fn notification_dismissed(&self) {
            self.events.lock().push(Event::Dismissed);
        }

        fn notification_failed(&self, error: &str) {
            self.events.lock().push(Event::Failed(error.to_string()));
        }
    }

    /// Counters shared between a test and the backends it creates.
    #[derive(Default)]
    struct BackendLog {
        shown: Mutex<Vec<String>>,
        dismissed: AtomicU64,
        removed: AtomicU64,
        events: Mutex<Vec<WeakNotification>>,
    }

    struct MockBackend {
        log: Arc<BackendLog>,
        fail_with: Option<String>,
    }

    impl NotificationBackend for MockBackend {
        fn show(&mut self, options: &NotificationOptions, events: WeakNotification) -> Result<()> {
            if let Some(ref error) = self.fail_with {
                return Err(NotificationError::Display(error.clone()));
            }
            self.log.shown.lock().push(options.title.clone());
            self.log.events.lock().push(events);
            Ok(())
        }

        fn dismiss(&mut self) -> Result<()> {
            self.log.dismissed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn remove(&mut self) {
            self.log.removed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn presenter_with(fail_with: Option<&str>) -> (NotificationPresenter, Arc<BackendLog>) {
        let log = Arc::new(BackendLog::default());
        let factory_log = log.clone();
        let fail_with = fail_with.map(str::to_string);
        let presenter = NotificationPresenter::new(move || {
            Box::new(MockBackend {
                log: factory_log.clone(),
                fail_with: fail_with.clone(),
            }) as Box<dyn NotificationBackend>
        });
        (presenter, log)
    }

    fn options() -> NotificationOptions {
        NotificationOptions::builder("Indexed")
            .body("report.pdf")
            .tag("ingest")
            .action(NotificationAction::new("button", "Open"))
            .action(NotificationAction::new("button", "Reveal"))
            .build()
            .unwrap()
    }

    fn shown(
        presenter: &NotificationPresenter,
        delegate: &Arc<RecordingDelegate>,
    ) -> NotificationHandle {
        let handle = presenter.create(delegate);
        presenter.show(handle, options()).unwrap();
        handle
    }

    #[test]
    fn test_click_notifies_then_destroys() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        assert_eq!(presenter.state(handle), Some(NotificationState::Shown));
        assert_eq!(log.shown.lock().as_slice(), ["Indexed"]);

        assert!(presenter.notification_clicked(handle));
        assert_eq!(delegate.events(), vec![Event::Click]);
        assert!(!presenter.contains(handle));
        assert!(presenter.is_empty());
    }

    #[test]
    fn test_only_one_terminal_transition_is_acted_on() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        assert!(presenter.notification_action_invoked(handle, 1));
        assert!(!presenter.notification_clicked(handle));
        assert!(!presenter.notification_dismissed(handle, true));
        assert!(!presenter.notification_failed(handle, "late"));

        assert_eq!(delegate.events(), vec![Event::Action(1)]);
    }

    #[test]
    fn test_action_index_out_of_range_is_ignored() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        assert!(!presenter.notification_action_invoked(handle, 2));
        assert!(presenter.contains(handle));
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_dismiss_without_destroy_waits_for_remove() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        presenter.dismiss(handle).unwrap();
        assert_eq!(log.dismissed.load(Ordering::SeqCst), 1);
        assert!(presenter.contains(handle));

        assert!(presenter.notification_dismissed(handle, false));
        assert_eq!(presenter.is_dismissed(handle), Some(true));
        assert_eq!(presenter.state(handle), Some(NotificationState::Dismissed));
        assert_eq!(delegate.events(), vec![Event::Dismissed]);

        // Nothing but remove() can finish it off now
        assert!(!presenter.notification_clicked(handle));
        assert!(!presenter.notification_failed(handle, ""));
        assert!(presenter.contains(handle));

        presenter.remove(handle).unwrap();
        assert_eq!(log.removed.load(Ordering::SeqCst), 1);
        assert!(!presenter.contains(handle));
        assert_eq!(delegate.events(), vec![Event::Dismissed]);
    }

    struct CannotHideBackend;

    impl NotificationBackend for CannotHideBackend {
        fn show(&mut self, _options: &NotificationOptions, _events: WeakNotification) -> Result<()> {
            Ok(())
        }

        fn dismiss(&mut self) -> Result<()> {
            Err(NotificationError::Display("hiding is not supported".to_string()))
        }
    }

    #[test]
    fn test_failed_dismiss_leaves_notification_live() {
        let presenter =
            NotificationPresenter::new(|| Box::new(CannotHideBackend) as Box<dyn NotificationBackend>);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        assert!(matches!(presenter.dismiss(handle), Err(NotificationError::Display(_))));
        assert!(presenter.contains(handle));
        assert_eq!(presenter.state(handle), Some(NotificationState::Shown));
        assert_eq!(presenter.is_dismissed(handle), Some(false));
        assert!(delegate.events().is_empty());

        // The toast is still on screen, so the user can still act on it
        assert!(presenter.notification_action_invoked(handle, 0));
        assert_eq!(delegate.events(), vec![Event::Action(0)]);
        assert!(!presenter.contains(handle));
    }

    #[test]
    fn test_remove_after_destroying_dismissal_is_harmless() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        assert!(presenter.notification_dismissed(handle, true));
        assert!(!presenter.contains(handle));

        presenter.remove(handle).unwrap();
        assert_eq!(log.removed.load(Ordering::SeqCst), 0);
        assert_eq!(delegate.events(), vec![Event::Dismissed]);
    }

    #[test]
    fn test_remove_on_live_notification_keeps_it() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        presenter.remove(handle).unwrap();
        assert_eq!(log.removed.load(Ordering::SeqCst), 1);
        assert!(presenter.contains(handle));
        assert!(presenter.notification_clicked(handle));
    }

    #[test]
    fn test_display_failure_goes_through_failed_path() {
        let (presenter, log) = presenter_with(Some("toast quota exceeded"));
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = presenter.create(&delegate);

        presenter.show(handle, options()).unwrap();

        assert!(log.shown.lock().is_empty());
        assert_eq!(
            delegate.events(),
            vec![Event::Failed("toast quota exceeded".to_string())]
        );
        assert!(!presenter.contains(handle));
    }

    #[test]
    fn test_show_twice_is_rejected() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        let err = presenter.show(handle, options()).unwrap_err();
        assert!(matches!(
            err,
            NotificationError::InvalidTransition { action: "show", state: "shown", .. }
        ));
        assert_eq!(presenter.options(handle).unwrap().title, "Indexed");
    }

    #[test]
    fn test_events_before_show_are_dropped() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = presenter.create(&delegate);

        assert!(!presenter.notification_clicked(handle));
        assert!(presenter.contains(handle));
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_unknown_handle() {
        let (presenter, _log) = presenter_with(None);
        let handle = NotificationHandle(42);

        assert!(matches!(
            presenter.show(handle, options()),
            Err(NotificationError::NotFound(_))
        ));
        assert!(matches!(presenter.dismiss(handle), Err(NotificationError::NotFound(_))));
        assert!(!presenter.close(handle));
    }

    #[test]
    fn test_dropped_delegate_is_not_called() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);
        drop(delegate);

        // Still a terminal transition, just with nobody to tell
        assert!(presenter.notification_clicked(handle));
        assert!(!presenter.contains(handle));
    }

    #[test]
    fn test_cleared_delegate_is_not_called() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        presenter.clear_delegate(handle).unwrap();
        assert!(presenter.notification_failed(handle, "gone"));
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_set_delegate_replaces_binding() {
        let (presenter, _log) = presenter_with(None);
        let first = Arc::new(RecordingDelegate::default());
        let second = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &first);

        presenter.set_delegate(handle, &second).unwrap();
        assert!(presenter.notification_clicked(handle));
        assert!(first.events().is_empty());
        assert_eq!(second.events(), vec![Event::Click]);
    }

    #[test]
    fn test_close_skips_delegate() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);
        let weak = log.events.lock()[0].clone();

        assert!(presenter.close(handle));
        assert!(!weak.is_alive());
        assert!(!weak.clicked());
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_backend_events_route_through_weak_handle() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);
        let weak = log.events.lock()[0].clone();

        assert_eq!(weak.handle(), handle);
        assert!(weak.is_alive());
        assert!(weak.dismissed(true));
        assert!(!weak.is_alive());
        assert_eq!(delegate.events(), vec![Event::Dismissed]);
    }

    #[test]
    fn test_weak_handle_outliving_presenter() {
        let (presenter, log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        shown(&presenter, &delegate);
        let weak = log.events.lock()[0].clone();

        drop(presenter);
        assert!(weak.presenter().is_none());
        assert!(!weak.is_alive());
        assert!(!weak.clicked());
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_identity_and_tag_lookup() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let first = shown(&presenter, &delegate);
        let second = shown(&presenter, &delegate);
        let untagged = presenter.create_detached();
        presenter
            .show(untagged, NotificationOptions::builder("Other").build().unwrap())
            .unwrap();

        assert_ne!(first, second);
        assert_ne!(presenter.notification_id(first), presenter.notification_id(second));
        assert_eq!(presenter.find_by_tag("ingest"), vec![first, second]);
        assert!(presenter.find_by_tag("").is_empty());
        assert_eq!(presenter.len(), 3);
    }

    #[test]
    fn test_debug_notifications_does_not_change_lifecycle() {
        let (presenter, log) = presenter_with(None);
        let presenter = presenter.with_debug_notifications(true);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        assert_eq!(log.shown.lock().len(), 1);
        assert!(presenter.notification_action_invoked(handle, 0));
        assert_eq!(delegate.events(), vec![Event::Action(0)]);
    }

    #[test]
    fn test_handles_are_not_reused() {
        let (presenter, _log) = presenter_with(None);
        let old = presenter.create_detached();
        assert!(presenter.close(old));

        let new = presenter.create_detached();
        assert_ne!(old, new);
        assert!(!presenter.weak(old).is_alive());
        assert!(presenter.weak(new).is_alive());
    }

    #[tokio::test]
    async fn test_deferred_callback_checks_liveness() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let weak = presenter.weak(handle);
        let deferred = tokio::spawn(async move {
            let _ = rx.await;
            weak.clicked()
        });

        // Torn down while the callback is suspended
        assert!(presenter.notification_dismissed(handle, true));
        tx.send(()).unwrap();

        assert!(!deferred.await.unwrap());
        assert_eq!(delegate.events(), vec![Event::Dismissed]);
    }

    #[test]
    fn test_concurrent_terminal_events_fire_once() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(RecordingDelegate::default());
        let handle = shown(&presenter, &delegate);

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let weak = presenter.weak(handle);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        weak.clicked()
                    } else {
                        weak.dismissed(true)
                    }
                })
            })
            .collect();

        let accepted = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|accepted| *accepted)
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(delegate.events().len(), 1);
        assert!(!presenter.contains(handle));
    }

    struct ReentrantDelegate {
        presenter: NotificationPresenter,
        seen_alive: Mutex<Option<bool>>,
    }

    impl NotificationDelegate for ReentrantDelegate {
        fn notification_click(&self) {
            let alive = self.presenter.len() > 0;
            *self.seen_alive.lock() = Some(alive);
        }
        fn notification_action(&self, _index: usize) {}
        fn notification_dismissed(&self) {}
        fn notification_failed(&self, _error: &str) {}
    }

    #[test]
    fn test_delegate_may_reenter_presenter() {
        let (presenter, _log) = presenter_with(None);
        let delegate = Arc::new(ReentrantDelegate {
            presenter: presenter.clone(),
            seen_alive: Mutex::new(None),
        });
        let handle = presenter.create(&delegate);
        presenter.show(handle, options()).unwrap();

        assert!(presenter.notification_clicked(handle));
        assert_eq!(*delegate.seen_alive.lock(), Some(false));
    }
}
