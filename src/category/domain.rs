//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// A user-defined label for transactions, e.g. 'Groceries' or 'Salary'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name, unique per user.
    pub name: CategoryName,
    /// Optional free text.
    pub description: Option<String>,
    /// Whether transactions in this category are income.
    ///
    /// Determines the sign convention used when summing activity: income is
    /// kept signed, expenses are reported as a magnitude.
    pub is_income: bool,
    /// Categories so marked are left out of the budget summary.
    pub exclude_from_budget: bool,
    /// Stored for clients, not used by any summary.
    pub exclude_from_totals: bool,
    /// Whether this category groups other categories.
    pub is_group: bool,
    /// The group this category belongs to.
    pub group_id: Option<CategoryId>,
    /// The display name of the group this category belongs to.
    pub group_category_name: Option<String>,
}

/// A validated category that has not been stored yet.
///
/// To create a new `NewCategory`, use [NewCategory::new] and the builder style setters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewCategory {
    pub name: CategoryName,
    pub description: Option<String>,
    pub is_income: bool,
    pub exclude_from_budget: bool,
    pub exclude_from_totals: bool,
    pub is_group: bool,
    pub group_id: Option<CategoryId>,
    pub group_category_name: Option<String>,
}

impl NewCategory {
    /// Create an expense category with no grouping and no exclusions.
    pub fn new(name: CategoryName) -> Self {
        Self {
            name,
            description: None,
            is_income: false,
            exclude_from_budget: false,
            exclude_from_totals: false,
            is_group: false,
            group_id: None,
            group_category_name: None,
        }
    }

    /// Set whether the category is for income.
    pub fn is_income(mut self, is_income: bool) -> Self {
        self.is_income = is_income;
        self
    }

    /// Set whether the category is left out of the budget summary.
    pub fn exclude_from_budget(mut self, exclude_from_budget: bool) -> Self {
        self.exclude_from_budget = exclude_from_budget;
        self
    }

    /// Put the category in the group `group_id` named `group_name`.
    pub fn group(mut self, group_id: CategoryId, group_name: &str) -> Self {
        self.group_id = Some(group_id);
        self.group_category_name = Some(group_name.to_owned());
        self
    }
}

/// JSON body for creating or updating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_income: bool,
    pub exclude_from_budget: bool,
    pub exclude_from_totals: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub group_id: Option<CategoryId>,
    #[serde(default)]
    pub group_category_name: Option<String>,
}

impl TryFrom<CategoryPayload> for NewCategory {
    type Error = Error;

    fn try_from(payload: CategoryPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            name: CategoryName::new(&payload.name)?,
            description: payload.description.filter(|text| !text.trim().is_empty()),
            is_income: payload.is_income,
            exclude_from_budget: payload.exclude_from_budget,
            exclude_from_totals: payload.exclude_from_totals,
            is_group: payload.is_group,
            group_id: payload.group_id,
            group_category_name: payload.group_category_name,
        })
    }
}
