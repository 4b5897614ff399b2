/// Creates a single provider [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use confab::{Role, cf_msg};
///
/// let message = cf_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.text(), "Done.");
/// ```
#[macro_export]
macro_rules! cf_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::System, $content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::User, $content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Assistant, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, or assistant; function messages need a call");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use confab::{Role, cf_messages};
///
/// let messages = cf_messages![
///     system => "You are concise.",
///     user => "List my open reports.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert_eq!(messages[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! cf_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::cf_msg!($role => $content)),+]
    };
}

/// Builds [`FunctionArguments`](crate::FunctionArguments) from key/value pairs.
/// Values go through `serde_json::json!`.
///
/// ```rust
/// use confab::cf_args;
///
/// let arguments = cf_args! { "text" => "hi", "repeat" => 2 };
/// assert_eq!(arguments["text"], "hi");
/// assert_eq!(arguments["repeat"], 2);
/// ```
#[macro_export]
macro_rules! cf_args {
    () => {
        $crate::FunctionArguments::new()
    };
    ($($key:expr => $value:tt),+ $(,)?) => {{
        let mut arguments = $crate::FunctionArguments::new();
        $(
            arguments.insert(::std::string::String::from($key), $crate::__serde_json::json!($value));
        )+
        arguments
    }};
}
