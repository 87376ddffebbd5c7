//! HTML templates for the portal.
//!
//! Pages are assembled from `format!` fragments styled with Tailwind CSS,
//! with Alpine.js driving tabs and the collapsible sidebar.

use chrono::{DateTime, Utc};
use clienthub_core::model::{DocumentStatus, Role};
use clienthub_core::onboarding::ClientStatus;

use crate::session::CurrentUser;

/// One sidebar entry: title, URL and Font Awesome icon.
pub type MenuItem = (&'static str, &'static str, &'static str);

const CLIENT_MENU: &[MenuItem] = &[
    ("Dashboard", "/client", "home"),
    ("Upload Documents", "/client/upload-documents", "upload"),
    ("My Documents", "/client/my-documents", "file-alt"),
    ("Onboarding Status", "/client/onboarding-status", "check-circle"),
];

const ADMIN_MENU: &[MenuItem] = &[
    ("Dashboard", "/admin", "home"),
    ("All Clients", "/admin/all-clients", "users"),
    ("Document Review", "/admin/document-review", "file-signature"),
    ("User Management", "/admin/user-management", "user-cog"),
    ("Settings", "/admin/settings", "cog"),
];

const SERVICE_CENTER_MENU: &[MenuItem] = &[
    ("Dashboard", "/service-center", "home"),
    ("Pending Clients", "/service-center/pending-clients", "clock"),
    ("Review Queue", "/service-center/review-queue", "shield-alt"),
    ("Completed", "/service-center/completed", "check-circle"),
];

/// Sidebar entries for a role.
pub fn menu_for(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Client => CLIENT_MENU,
        Role::Admin => ADMIN_MENU,
        Role::ServiceCenter => SERVICE_CENTER_MENU,
    }
}

/// Base HTML document with the Tailwind and Alpine setup.
fn document(title: &str, company: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en" x-data="{{ sidebarOpen: true }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {company}</title>
    <script src="https://cdn.tailwindcss.com"></script>
    <script>
        tailwind.config = {{
            theme: {{
                extend: {{
                    colors: {{
                        primary: {{
                            50: '#eff6ff',
                            100: '#dbeafe',
                            500: '#3b82f6',
                            600: '#2563eb',
                            700: '#1d4ed8',
                            900: '#1e3a8a',
                        }}
                    }}
                }}
            }}
        }}
    </script>
    <script defer src="https://unpkg.com/alpinejs@3.x.x/dist/cdn.min.js"></script>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
    <link rel="stylesheet" href="/assets/portal.css">
</head>
<body class="bg-gray-50 min-h-screen">
{body}
</body>
</html>"##,
        title = html_escape(title),
        company = html_escape(company),
    )
}

/// Page shell for signed-in users: role sidebar, breadcrumb header and
/// a user footer with sign-out.
pub fn layout(title: &str, path: &str, user: &CurrentUser, company: &str, content: &str) -> String {
    let body = format!(
        r##"<div class="flex">
        {SIDEBAR}
        <div class="flex-1 min-w-0">
            <header class="bg-white border-b border-gray-200 px-6 py-3 flex items-center gap-3 sticky top-0 z-40">
                <button @click="sidebarOpen = !sidebarOpen" class="p-2 hover:bg-gray-100 rounded-lg">
                    <i class="fas fa-bars text-gray-600"></i>
                </button>
                <nav class="text-sm text-gray-500" aria-label="Breadcrumb">
                    <span>{role_label}</span>
                    <span class="mx-2">/</span>
                    <span class="text-gray-900 font-medium">{title}</span>
                </nav>
            </header>
            <main class="p-6 lg:p-8">
                <div class="max-w-7xl mx-auto">
                    {content}
                </div>
            </main>
        </div>
    </div>"##,
        SIDEBAR = sidebar(path, user, company),
        role_label = user.role.label(),
        title = html_escape(title),
    );
    document(title, company, &body)
}

fn sidebar(path: &str, user: &CurrentUser, company: &str) -> String {
    let links: String = menu_for(user.role)
        .iter()
        .map(|(title, url, icon)| {
            let active = if *url == path {
                "bg-primary-50 text-primary-600"
            } else {
                "text-gray-700 hover:bg-primary-50"
            };
            format!(
                r##"<a href="{url}" class="flex items-center gap-3 px-4 py-3 {active} rounded-lg transition-colors">
                    <i class="fas fa-{icon} w-5"></i>
                    <span>{title}</span>
                </a>"##
            )
        })
        .collect();

    format!(
        r##"<aside class="w-64 bg-white border-r border-gray-200 min-h-screen flex flex-col transition-all duration-300"
               :class="{{ '-ml-64': !sidebarOpen }}">
            <div class="px-6 py-5 border-b border-gray-200">
                <a href="{home}" class="flex items-center gap-2 font-bold text-gray-900">
                    <i class="fas fa-building text-primary-600"></i>
                    <span>{company}</span>
                </a>
            </div>
            <nav class="p-4 space-y-1 flex-1">
                <div class="pb-2 px-4 text-xs font-semibold text-gray-400 uppercase tracking-wider">Navigation</div>
                {links}
            </nav>
            <div class="p-4 border-t border-gray-200">
                <div class="flex items-center gap-3">
                    <div class="w-9 h-9 rounded-full bg-primary-100 text-primary-600 flex items-center justify-center font-semibold">{initial}</div>
                    <div class="min-w-0 flex-1">
                        <p class="text-sm font-medium text-gray-900 truncate">{name}</p>
                        <p class="text-xs text-gray-500 truncate">{email}</p>
                    </div>
                    <form method="post" action="/logout">
                        <button type="submit" title="Sign out" class="p-2 text-gray-500 hover:text-red-600">
                            <i class="fas fa-sign-out-alt"></i>
                        </button>
                    </form>
                </div>
            </div>
        </aside>"##,
        home = user.role.home_path(),
        company = html_escape(company),
        initial = html_escape(&initial(user.user.display_name())),
        name = html_escape(user.user.display_name()),
        email = html_escape(&user.user.email),
    )
}

fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Centered page without navigation, used by the login screen.
pub fn auth_layout(title: &str, company: &str, content: &str) -> String {
    let body = format!(
        r##"<div class="min-h-screen flex items-center justify-center px-4">
        <div class="w-full max-w-md">
            <div class="text-center mb-8">
                <i class="fas fa-building text-4xl text-primary-600"></i>
                <h1 class="mt-3 text-2xl font-bold text-gray-900">{company}</h1>
            </div>
            {content}
        </div>
    </div>"##,
        company = html_escape(company),
    );
    document(title, company, &body)
}

/// Page heading with subtitle.
pub fn page_header(title: &str, subtitle: &str) -> String {
    format!(
        r##"<div class="mb-8">
            <h1 class="text-2xl font-bold text-gray-900">{title}</h1>
            <p class="text-gray-500 mt-1">{subtitle}</p>
        </div>"##,
        title = html_escape(title),
        subtitle = html_escape(subtitle),
    )
}

/// Card component.
pub fn card(title: &str, content: &str) -> String {
    format!(
        r##"<div class="bg-white rounded-xl shadow-sm border border-gray-200 overflow-hidden">
            <div class="px-6 py-4 border-b border-gray-200">
                <h3 class="text-lg font-semibold text-gray-900">{title}</h3>
            </div>
            <div class="p-6">
                {content}
            </div>
        </div>"##
    )
}

/// Stats card component.
pub fn stats_card(title: &str, value: &str, icon: &str, color: &str) -> String {
    format!(
        r##"<div class="bg-white rounded-xl shadow-sm border border-gray-200 p-6">
            <div class="flex items-center justify-between">
                <div>
                    <p class="text-sm text-gray-500">{title}</p>
                    <p class="text-2xl font-bold text-gray-900 mt-1">{value}</p>
                </div>
                <div class="w-12 h-12 rounded-full bg-{color}-100 flex items-center justify-center">
                    <i class="fas fa-{icon} text-{color}-500 text-xl"></i>
                </div>
            </div>
        </div>"##
    )
}

/// Badge component.
pub fn badge(text: &str, color: &str) -> String {
    format!(
        r##"<span class="inline-flex items-center px-2.5 py-0.5 rounded-full text-xs font-medium bg-{color}-100 text-{color}-800">{text}</span>"##,
        text = html_escape(text),
    )
}

/// Badge color for a document status.
pub fn document_status_color(status: &DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Approved | DocumentStatus::Completed => "green",
        DocumentStatus::UnderReview => "blue",
        DocumentStatus::Pending => "yellow",
        DocumentStatus::Rejected => "red",
        DocumentStatus::Other(_) => "gray",
    }
}

pub fn document_status_badge(status: &DocumentStatus) -> String {
    badge(&status.label(), document_status_color(status))
}

/// Badge color for a derived client status.
pub fn client_status_color(status: ClientStatus) -> &'static str {
    match status {
        ClientStatus::Completed => "green",
        ClientStatus::InProgress | ClientStatus::UnderReview => "blue",
        ClientStatus::Pending => "yellow",
        ClientStatus::Rejected => "red",
    }
}

pub fn client_status_badge(status: ClientStatus) -> String {
    badge(status.label(), client_status_color(status))
}

/// Horizontal progress bar for a whole-number percentage.
pub fn progress_bar(percent: u32) -> String {
    let percent = percent.min(100);
    format!(
        r##"<div class="flex items-center gap-3">
            <div class="flex-1 h-2 bg-gray-200 rounded-full overflow-hidden">
                <div class="h-2 bg-primary-600 rounded-full" style="width: {percent}%"></div>
            </div>
            <span class="text-sm font-medium text-gray-700">{percent}%</span>
        </div>"##
    )
}

/// Table component. Cells are inserted as HTML; escape text before passing it.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let headers_html: String = headers
        .iter()
        .map(|h| format!(r#"<th class="px-6 py-3 text-left text-xs font-medium text-gray-500 uppercase tracking-wider">{h}</th>"#))
        .collect();

    let rows_html: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!(r#"<td class="px-6 py-4 whitespace-nowrap text-sm text-gray-900">{cell}</td>"#))
                .collect();
            format!(r#"<tr class="hover:bg-gray-50">{cells}</tr>"#)
        })
        .collect();

    format!(
        r##"<div class="overflow-x-auto">
            <table class="min-w-full divide-y divide-gray-200">
                <thead class="bg-gray-50">
                    <tr>{headers_html}</tr>
                </thead>
                <tbody class="bg-white divide-y divide-gray-200">
                    {rows_html}
                </tbody>
            </table>
        </div>"##
    )
}

/// Empty state component.
pub fn empty_state(icon: &str, title: &str, description: &str, action: Option<(&str, &str)>) -> String {
    let action_html = action.map_or(String::new(), |(text, href)| {
        format!(r##"<a href="{href}" class="mt-4 inline-flex items-center gap-2 bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
            <i class="fas fa-plus"></i> {text}
        </a>"##)
    });

    format!(
        r##"<div class="text-center py-12">
            <i class="fas fa-{icon} text-4xl text-gray-400 mb-4"></i>
            <h3 class="text-lg font-medium text-gray-900">{title}</h3>
            <p class="mt-1 text-gray-500">{description}</p>
            {action_html}
        </div>"##
    )
}

/// Tab container: `(key, label, content)` per tab, first tab active.
pub fn tabs(id: &str, tabs: &[(&str, &str, String)]) -> String {
    let tab_buttons: String = tabs
        .iter()
        .map(|(key, label, _)| {
            format!(
                r##"<button type="button" @click="activeTab = '{key}'"
                        :class="{{ 'border-primary-600 text-primary-600': activeTab === '{key}', 'border-transparent text-gray-500 hover:text-gray-700 hover:border-gray-300': activeTab !== '{key}' }}"
                        class="px-4 py-2 border-b-2 font-medium text-sm transition-colors">
                    {label}
                </button>"##
            )
        })
        .collect();

    let tab_contents: String = tabs
        .iter()
        .map(|(key, _, content)| {
            format!(
                r##"<div x-show="activeTab === '{key}'" x-cloak>
                    {content}
                </div>"##
            )
        })
        .collect();

    let first_key = tabs.first().map(|(k, _, _)| *k).unwrap_or("default");

    format!(
        r##"<div x-data="{{ activeTab: '{first_key}' }}" id="{id}">
            <div class="border-b border-gray-200 mb-4">
                <nav class="flex gap-2">
                    {tab_buttons}
                </nav>
            </div>
            <div>
                {tab_contents}
            </div>
        </div>"##
    )
}

/// Input field component.
pub fn input(name: &str, label: &str, input_type: &str, value: &str, placeholder: &str) -> String {
    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700">{label}</label>
            <input type="{input_type}" name="{name}" id="{name}" value="{value}" placeholder="{placeholder}"
                   class="w-full px-4 py-2 border border-gray-300 rounded-lg bg-white text-gray-900 focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
        </div>"##,
        value = html_escape(value),
    )
}

/// Select field component: `(value, text, selected)` per option.
pub fn select(name: &str, label: &str, options: &[(String, String, bool)]) -> String {
    let options_html: String = options
        .iter()
        .map(|(value, text, selected)| {
            let selected = if *selected { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                html_escape(value),
                html_escape(text)
            )
        })
        .collect();

    let label_html = if label.is_empty() {
        String::new()
    } else {
        format!(r#"<label for="{name}" class="block text-sm font-medium text-gray-700">{label}</label>"#)
    };

    format!(
        r##"<div class="space-y-1">
            {label_html}
            <select name="{name}" id="{name}"
                    class="w-full px-4 py-2 border border-gray-300 rounded-lg bg-white text-gray-900 focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
                {options_html}
            </select>
        </div>"##
    )
}

/// Small inline POST form with one button.
pub fn action_button(action: &str, text: &str, variant: &str, hidden: &[(&str, &str)]) -> String {
    let (bg, hover) = match variant {
        "success" => ("bg-green-600", "hover:bg-green-700"),
        "danger" => ("bg-red-600", "hover:bg-red-700"),
        _ => ("bg-primary-600", "hover:bg-primary-700"),
    };
    let fields: String = hidden
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<input type="hidden" name="{name}" value="{}">"#,
                html_escape(value)
            )
        })
        .collect();
    format!(
        r##"<form method="post" action="{action}" class="inline">
            {fields}
            <button type="submit" class="{bg} {hover} text-white px-3 py-1 rounded-lg text-xs font-medium transition-colors">{text}</button>
        </form>"##
    )
}

/// Dismissible banner for `?notice=` / `?error=` messages.
pub fn notice_banner(notice: Option<&str>, error: Option<&str>) -> String {
    let (message, color, icon) = match (error, notice) {
        (Some(e), _) if !e.is_empty() => (e, "red", "exclamation-circle"),
        (_, Some(n)) if !n.is_empty() => (n, "green", "check-circle"),
        _ => return String::new(),
    };
    format!(
        r##"<div x-data="{{ open: true }}" x-show="open" class="mb-6 flex items-center gap-3 px-4 py-3 rounded-lg bg-{color}-50 border border-{color}-200 text-{color}-800">
            <i class="fas fa-{icon}"></i>
            <span class="flex-1">{message}</span>
            <button type="button" @click="open = false"><i class="fas fa-times"></i></button>
        </div>"##,
        message = html_escape(message),
    )
}

/// Link styled as a small button.
pub fn link_button(href: &str, text: &str) -> String {
    format!(
        r##"<a href="{href}" class="inline-flex items-center gap-1 text-primary-600 hover:text-primary-700 text-sm font-medium">{text}</a>"##
    )
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y").to_string()
}

pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format("%b %d, %Y %H:%M").to_string()
}

pub fn format_optional_date(at: Option<DateTime<Utc>>) -> String {
    at.map(format_date).unwrap_or_else(|| "-".to_string())
}

/// Escape text for HTML element and attribute contexts.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
