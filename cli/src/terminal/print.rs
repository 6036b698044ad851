use colored::*;
use scopekeep_common::scope::Scope;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;

const KEY_WIDTH: usize = 9;

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = UnicodeWidthStr::width(formatted.as_str());

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn tree_head(idx: usize, name: &str, detail: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().color(colors::ACCENT));
    let output: String = format!(
        "{} {} {}",
        idx_str.color(colors::SEPARATOR),
        name.color(colors::PRIMARY),
        detail.color(colors::TEXT_DEFAULT)
    );
    print(&output);
}

/// Prints `key: value` pairs as the branches of the last tree head.
pub fn as_tree_one_level(key_value_pair: Vec<(String, ColoredString)>) {
    for (i, (key, value)) in key_value_pair.iter().enumerate() {
        let last: bool = i + 1 == key_value_pair.len();
        let branch: ColoredString = if !last {
            "├─".bright_black()
        } else {
            "└─".bright_black()
        };
        let output: String = format!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            ".".repeat(KEY_WIDTH.saturating_sub(key.len())).color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        );
        print(&output);
    }
}

pub fn aligned_line(key: &str, value: ColoredString) {
    let dots: String = ".".repeat((KEY_WIDTH + 1).saturating_sub(key.len()));
    print(&format!(
        "{} {}{}{} {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::PRIMARY),
        dots.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value
    ));
}

/// Short `active/passive` badge, green where a flag is set.
pub fn scope_badge(scope: Scope) -> ColoredString {
    let flag = |set: bool, name: &str| {
        if set {
            name.color(colors::IN_SCOPE).bold().to_string()
        } else {
            name.color(colors::OUT_OF_SCOPE).to_string()
        }
    };
    format!("{} {}", flag(scope.active, "active"), flag(scope.passive, "passive")).normal()
}

pub fn nothing_stored() {
    print(&format!("{}", "  nothing was stored".red().bold()));
}

pub fn end_of_program() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR)));
}
