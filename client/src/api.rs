//! Backend operations, declared once each.
//!
//! An [`Operation`] carries the method, path, auth requirement and the cache
//! tags it provides (queries) or invalidates (mutations). The [`Client`]
//! facade turns them into requests.
//!
//! [`Client`]: crate::Client

use http::Method;

use crate::cache::{CacheTag, QueryKey};
use crate::http::RequestOptions;

#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub requires_auth: bool,
    pub provides: &'static [CacheTag],
    pub invalidates: &'static [CacheTag],
}

impl Operation {
    pub fn is_query(&self) -> bool {
        self.method == Method::GET
    }

    /// Path plus the url-encoded query string, if any.
    pub fn path_with(&self, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return self.path.to_string();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{}?{}", self.path, query)
    }

    pub fn key(&self, params: &[(&str, &str)]) -> QueryKey {
        QueryKey::new(self.name, params)
    }

    pub fn request(&self, params: &[(&str, &str)]) -> RequestOptions {
        let options = RequestOptions::new(self.method.clone(), self.path_with(params));
        if self.requires_auth {
            options
        } else {
            options.without_auth()
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Credentials go in the query string.
pub static LOGIN: Operation = Operation {
    name: "login",
    method: Method::POST,
    path: "/auth/login",
    requires_auth: false,
    provides: &[],
    invalidates: &[],
};

pub static REFRESH_TOKEN: Operation = Operation {
    name: "refreshToken",
    method: Method::POST,
    path: "/auth/refresh-token",
    requires_auth: true,
    provides: &[],
    invalidates: &[],
};

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub static SEARCH_USERS: Operation = Operation {
    name: "searchUsers",
    method: Method::GET,
    path: "/api/searchUsers",
    requires_auth: true,
    provides: &[CacheTag::User],
    invalidates: &[],
};

pub static VOTER_REPORT: Operation = Operation {
    name: "getVoterReport",
    method: Method::GET,
    path: "/api/voter-report",
    requires_auth: true,
    provides: &[CacheTag::VoterData],
    invalidates: &[],
};

pub static BOOTH_LOCATIONS: Operation = Operation {
    name: "getBoothLocations",
    method: Method::GET,
    path: "/api/booth-locations",
    requires_auth: true,
    provides: &[CacheTag::VoterData],
    invalidates: &[],
};

pub static PRESEARCH_VOTERS: Operation = Operation {
    name: "presearchVoters",
    method: Method::GET,
    path: "/api/voters/presearch",
    requires_auth: true,
    provides: &[CacheTag::VoterData],
    invalidates: &[],
};

pub static SEARCH_VOTERS: Operation = Operation {
    name: "searchVoters",
    method: Method::GET,
    path: "/api/voters/search",
    requires_auth: true,
    provides: &[CacheTag::VoterData],
    invalidates: &[],
};

pub static GET_CONFIG: Operation = Operation {
    name: "getConfig",
    method: Method::GET,
    path: "/api/config",
    requires_auth: true,
    provides: &[CacheTag::Config],
    invalidates: &[],
};

pub static USER_PRINT_REPORT: Operation = Operation {
    name: "getUserPrintReport",
    method: Method::GET,
    path: "/report/user-prints",
    requires_auth: true,
    provides: &[CacheTag::VoterData],
    invalidates: &[],
};

pub static PRINT_DETAIL: Operation = Operation {
    name: "getPrintDetail",
    method: Method::GET,
    path: "/report/total-prints",
    requires_auth: true,
    provides: &[CacheTag::VoterData],
    invalidates: &[],
};

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Used by both the JSON and the multipart (with banner) variants.
pub static SAVE_CONFIG: Operation = Operation {
    name: "saveConfig",
    method: Method::POST,
    path: "/api/config",
    requires_auth: true,
    provides: &[],
    invalidates: &[CacheTag::Config],
};

pub static UPLOAD_VOTER_ROLL: Operation = Operation {
    name: "uploadVoterRoll",
    method: Method::POST,
    path: "/api/excel/upload",
    requires_auth: true,
    provides: &[],
    invalidates: &[CacheTag::VoterData],
};
