//! Role and department registry
//!
//! Roles are client-asserted. The registry only decides which document
//! departments the backend should consult for a role; it does not
//! authenticate anything.

/// Catch-all department used when a role matches nothing more specific
pub const GENERAL_DEPARTMENT: &str = "general";

/// A user role that can be attached to a chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    /// Identifier sent to the backend as `user_role`
    pub id: &'static str,
    /// Human readable name
    pub display_name: &'static str,
}

/// A group of document sources gated by role membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Department {
    /// Department name
    pub name: &'static str,
    /// Document-source folders belonging to the department
    pub folders: &'static [&'static str],
    /// Roles allowed to see the department
    pub allowed_roles: &'static [&'static str],
}

impl Department {
    /// Check if the given role may see this department
    pub fn allows(&self, role: &str) -> bool {
        self.allowed_roles.contains(&role)
    }

    fn is_general(&self) -> bool {
        self.name == GENERAL_DEPARTMENT
    }
}

static ROLES: &[Role] = &[
    Role { id: "admin", display_name: "Administrator" },
    Role { id: "hr_manager", display_name: "HR Manager" },
    Role { id: "hr_staff", display_name: "HR Staff" },
    Role { id: "finance_manager", display_name: "Finance Manager" },
    Role { id: "accountant", display_name: "Accountant" },
    Role { id: "engineering_manager", display_name: "Engineering Manager" },
    Role { id: "engineer", display_name: "Engineer" },
    Role { id: "sales_manager", display_name: "Sales Manager" },
    Role { id: "sales_rep", display_name: "Sales Representative" },
    Role { id: "legal_counsel", display_name: "Legal Counsel" },
    Role { id: "employee", display_name: "Employee" },
    Role { id: "contractor", display_name: "Contractor" },
];

// Order matters: lookups return the first matching department.
static DEPARTMENTS: &[Department] = &[
    Department {
        name: "hr",
        folders: &["hr_policies", "benefits", "onboarding"],
        allowed_roles: &["admin", "hr_manager", "hr_staff"],
    },
    Department {
        name: "finance",
        folders: &["finance_reports", "budgets", "expense_policies"],
        allowed_roles: &["admin", "finance_manager", "accountant"],
    },
    Department {
        name: "engineering",
        folders: &["engineering_docs", "runbooks", "architecture"],
        allowed_roles: &["admin", "engineering_manager", "engineer", "contractor"],
    },
    Department {
        name: "sales",
        folders: &["sales_playbooks", "pricing", "customer_faq"],
        allowed_roles: &["admin", "sales_manager", "sales_rep"],
    },
    Department {
        name: "legal",
        folders: &["contracts", "compliance"],
        allowed_roles: &["admin", "legal_counsel"],
    },
    // Contractors only see engineering.
    Department {
        name: GENERAL_DEPARTMENT,
        folders: &["general", "company_policies", "announcements"],
        allowed_roles: &[
            "admin",
            "hr_manager",
            "hr_staff",
            "finance_manager",
            "accountant",
            "engineering_manager",
            "engineer",
            "sales_manager",
            "sales_rep",
            "legal_counsel",
            "employee",
        ],
    },
];

/// All registered roles, in display order
pub fn all_roles() -> &'static [Role] {
    ROLES
}

/// All registered departments, in lookup order
pub fn departments() -> &'static [Department] {
    DEPARTMENTS
}

/// Find a role by identifier
pub fn find_role(id: &str) -> Option<&'static Role> {
    ROLES.iter().find(|role| role.id == id)
}

/// Check if a role identifier is registered
pub fn is_known_role(id: &str) -> bool {
    find_role(id).is_some()
}

/// Resolve the primary department for a role
///
/// Returns the first department other than `general` whose allowed roles
/// contain `role`. Roles that match nothing else, including unknown roles,
/// resolve to `general`.
pub fn get_department_for_role(role: &str) -> &'static str {
    DEPARTMENTS
        .iter()
        .filter(|dept| !dept.is_general())
        .find(|dept| dept.allows(role))
        .map(|dept| dept.name)
        .unwrap_or(GENERAL_DEPARTMENT)
}

/// Every department a role may see, `general` last
pub fn departments_for_role(role: &str) -> Vec<&'static Department> {
    let (general, specific): (Vec<_>, Vec<_>) = DEPARTMENTS
        .iter()
        .filter(|dept| dept.allows(role))
        .partition(|dept| dept.is_general());
    specific.into_iter().chain(general).collect()
}
