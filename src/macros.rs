/// Declares the static event -> action binding table.
///
/// Each `Kind => Action` pair names an `EventKind` variant and the `Action`
/// variant it triggers. The expansion is a `BINDINGS` constant that views look
/// up through `action_for`, so the rendering layer only has to emit events.
///
/// # Example
/// ```ignore
/// bind_events! {
///     StatusControlClicked => ChangeSkillStatus,
///     ReloadRequested => ReloadView,
/// }
/// ```
/// expands to
/// ```ignore
/// pub const BINDINGS: &[(EventKind, Action)] = &[
///     (EventKind::StatusControlClicked, Action::ChangeSkillStatus),
///     (EventKind::ReloadRequested, Action::ReloadView),
/// ];
/// ```
#[macro_export]
macro_rules! bind_events {
    ($($kind:ident => $action:ident),* $(,)?) => {
        pub const BINDINGS: &[(EventKind, Action)] = &[
            $(
                (EventKind::$kind, Action::$action),
            )*
        ];
    };
}
