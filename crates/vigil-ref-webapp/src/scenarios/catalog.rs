//! The behavior graph of the simulated todo app.
//!
//! ```text
//! sign-up ─┬─ sign-out
//!          ├─ sign-in-wrong-password
//!          ├─ sign-in
//!          └─ create-item ─┬─ view-items
//!                          └─ delete-item
//! ```

use vigil_contracts::behavior::{Behavior, BehaviorMap, Scenario};

pub const SIGN_UP: &str = "sign-up";
pub const SIGN_OUT: &str = "sign-out";
pub const SIGN_IN_WRONG_PASSWORD: &str = "sign-in-wrong-password";
pub const SIGN_IN: &str = "sign-in";
pub const CREATE_ITEM: &str = "create-item";
pub const VIEW_ITEMS: &str = "view-items";
pub const DELETE_ITEM: &str = "delete-item";

/// Build the todo app behavior map, in declaration order.
pub fn todo_app() -> BehaviorMap {
    let behaviors = vec![
        Behavior::new(SIGN_UP, "Sign Up")
            .with_description("A visitor creates an account and is signed in.")
            .at_page("/signup")
            .with_scenario(
                Scenario::new("new account")
                    .act(r#"Set the email field to "ada@example.com""#)
                    .act(r#"Set the password field to "hunter22""#)
                    .act("Click the Sign Up button")
                    .check("The user is signed in"),
            ),
        Behavior::new(SIGN_OUT, "Sign Out")
            .with_description("A signed-in user signs out and returns to the home page.")
            .depends_on(SIGN_UP)
            .at_page("/items")
            .with_scenario(
                Scenario::new("from items")
                    .act("Click the Log Out button")
                    .check(r#"The page shows "Log In""#),
            ),
        Behavior::new(SIGN_IN_WRONG_PASSWORD, "Sign In With Wrong Password")
            .with_description("Logging in with a wrong password is refused.")
            .depends_on(SIGN_UP)
            .at_page("/login")
            .with_scenario(
                Scenario::new("wrong password")
                    .act(r#"Set the email field to "ada@example.com""#)
                    .act(r#"Set the password field to "not-my-password""#)
                    .act("Click the Log In button")
                    .check(r#"The page shows "Invalid email or password""#),
            ),
        Behavior::new(SIGN_IN, "Sign In")
            .with_description("A registered user logs in.")
            .depends_on(SIGN_UP)
            .at_page("/login")
            .with_scenario(
                Scenario::new("valid credentials")
                    .act(r#"Set the email field to "ada@example.com""#)
                    .act(r#"Set the password field to "placeholder""#)
                    .act("Click the Log In button")
                    .check("The user is signed in"),
            ),
        Behavior::new(CREATE_ITEM, "Create Item")
            .with_description("A signed-in user adds an item to their list.")
            .depends_on(SIGN_UP)
            .at_page("/items/new")
            .with_scenario(
                Scenario::new("buy milk")
                    .act(r#"Set the title field to "Buy milk""#)
                    .act("Click the Save button")
                    .check(r#"The list shows "Buy milk""#),
            ),
        Behavior::new(VIEW_ITEMS, "View Items")
            .with_description("The items page lists the user's items.")
            .depends_on(CREATE_ITEM)
            .at_page("/items")
            .with_scenario(Scenario::new("list").check("The user's items are listed")),
        Behavior::new(DELETE_ITEM, "Delete Item")
            .with_description("A user deletes an item and it disappears from the list.")
            .depends_on(CREATE_ITEM)
            .at_page("/items")
            .with_scenario(
                Scenario::new("delete milk")
                    .act("Click the Delete Buy milk button")
                    .check(r#""Buy milk" is no longer listed"#),
            ),
    ];

    behaviors.into_iter().map(|b| (b.id.clone(), b)).collect()
}
