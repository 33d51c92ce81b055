//! Hard-coded selectors and the DOM-mutation scripts the transition
//! handlers inject. This workflow targets one site; nothing here is meant
//! to generalize.

/// Login form on the landing page.
pub const LOGIN_FORM: &str = "form#login_form";

/// Element only present once a user is logged in.
pub const PROFILE_ICON: &str = r#"div[data-click="profile_icon"]"#;

/// "Remove block" link on a blocked member row.
pub const UNBAN_LINK: &str = r#"#pagelet_group_blocked div[id^="member_"] .adminActions > a[ajaxify*="action=remove_block"]"#;

/// Confirm button in the remove-block dialog.
pub const CONFIRM_BUTTON: &str = r#"button[name="remove_block"]"#;

/// Fill the login form and submit it. Credentials are embedded as JSON
/// string literals so quoting in either value cannot break the script.
pub fn fill_login(username: &str, password: &str) -> String {
    let user = serde_json::json!(username);
    let pass = serde_json::json!(password);
    format!(
        r#"(function() {{
    var form = document.forms.login_form;
    form.querySelector('[name="email"]').value = {user};
    form.querySelector('[name="pass"]').value = {pass};
    form.querySelector('input[type="submit"]').click();
}})()"#
    )
}

/// Click the first element matching `selector`, falling back to a
/// synthetic mouse event for anchors without a native `click`.
pub fn click_element(selector: &str) -> String {
    let sel = serde_json::json!(selector);
    format!(
        r#"(function() {{
    var el = document.querySelector({sel});
    if (!el) {{ return false; }}
    if (el.click) {{
        el.click();
    }} else {{
        var evt = document.createEvent('MouseEvents');
        evt.initMouseEvent('click', true, true, window, 0, 0, 0, 0, 0, false, false, false, false, 0, null);
        el.dispatchEvent(evt);
    }}
    return true;
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_script_escapes_credentials() {
        let script = fill_login(r#"user"with@quotes"#, r"pa\ss'word");
        assert!(script.contains(r#""user\"with@quotes""#));
        assert!(script.contains(r#""pa\\ss'word""#));
        assert!(script.contains("login_form"));
    }

    #[test]
    fn click_script_embeds_selector_as_json() {
        let script = click_element(CONFIRM_BUTTON);
        assert!(script.contains(r#""button[name=\"remove_block\"]""#));
        assert!(script.contains("initMouseEvent"));
    }
}
