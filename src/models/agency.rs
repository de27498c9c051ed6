use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Tenant root. Owns sub-accounts, users, invitations and sidebar options.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Agency {
    pub id: RecordId,
    pub name: String,
    pub company_email: String,
    #[serde(default)]
    pub company_phone: String,
    #[serde(default)]
    pub white_label: bool,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub agency_logo: String,
    pub goal: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Editable part of an agency, written on both create and update.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AgencyDetails {
    pub name: String,
    pub company_email: String,
    pub company_phone: String,
    pub white_label: bool,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub state: String,
    pub country: String,
    pub agency_logo: String,
    pub goal: u32,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateAgency {
    pub name: String,
    pub company_email: String,
    pub company_phone: String,
    pub white_label: bool,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub state: String,
    pub country: String,
    pub agency_logo: String,
    pub goal: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl CreateAgency {
    pub fn new(details: AgencyDetails, now: String) -> Self {
        Self {
            name: details.name,
            company_email: details.company_email,
            company_phone: details.company_phone,
            white_label: details.white_label,
            address: details.address,
            city: details.city,
            zip_code: details.zip_code,
            state: details.state,
            country: details.country,
            agency_logo: details.agency_logo,
            goal: details.goal,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SubAccount {
    pub id: RecordId,
    pub name: String,
    pub agency_id: RecordId,
    pub created_at: String,
}

/// Navigation entry. Agency-level entries have no `subaccount_id`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SidebarOption {
    pub id: RecordId,
    pub name: String,
    pub icon: String,
    pub link: String,
    pub agency_id: RecordId,
    #[serde(default)]
    pub subaccount_id: Option<RecordId>,
}

#[derive(Debug, Clone)]
pub struct SubAccountNavigation {
    pub subaccount: SubAccount,
    pub sidebar_options: Vec<SidebarOption>,
}

/// An agency with its own sidebar and its sub-accounts' sidebars.
#[derive(Debug, Clone)]
pub struct AgencyNavigation {
    pub agency: Agency,
    pub sidebar_options: Vec<SidebarOption>,
    pub subaccounts: Vec<SubAccountNavigation>,
}

impl AgencyNavigation {
    /// Splits `options` between the agency and the sub-account they belong to.
    pub fn assemble(
        agency: Agency,
        subaccounts: Vec<SubAccount>,
        options: Vec<SidebarOption>,
    ) -> Self {
        let (sub_options, sidebar_options): (Vec<_>, Vec<_>) =
            options.into_iter().partition(|o| o.subaccount_id.is_some());
        let subaccounts = subaccounts
            .into_iter()
            .map(|subaccount| SubAccountNavigation {
                sidebar_options: sub_options
                    .iter()
                    .filter(|o| o.subaccount_id.as_ref() == Some(&subaccount.id))
                    .cloned()
                    .collect(),
                subaccount,
            })
            .collect();
        Self {
            agency,
            sidebar_options,
            subaccounts,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreateSidebarOption {
    pub name: String,
    pub icon: String,
    pub link: String,
    pub agency_id: RecordId,
    pub created_at: String,
}

/// Navigation every new agency starts with, linking under `/agency/{key}`.
pub fn default_sidebar_options(
    agency_id: &RecordId,
    agency_key: &str,
    created_at: &str,
) -> Vec<CreateSidebarOption> {
    [
        ("Dashboard", "category", ""),
        ("Launchpad", "clipboardIcon", "/launchpad"),
        ("Billing", "payment", "/billing"),
        ("Settings", "settings", "/settings"),
        ("Sub Accounts", "person", "/all-subaccounts"),
        ("Team", "shield", "/team"),
    ]
    .into_iter()
    .map(|(name, icon, suffix)| CreateSidebarOption {
        name: name.to_string(),
        icon: icon.to_string(),
        link: format!("/agency/{}{}", agency_key, suffix),
        agency_id: agency_id.clone(),
        created_at: created_at.to_string(),
    })
    .collect()
}
