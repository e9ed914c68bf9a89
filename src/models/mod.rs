mod id;
mod account;
mod user;

pub use id::{DocumentId, InvalidDocumentId};
pub use account::{
    Account, AccountFilter, AccountStatus, AccountType, AccountUpdate, CreateAccount,
    CreateInstitution, Institution, NewAccount,
};
pub use user::{
    normalize_email, validate_username, CurrentUser, LoginRequest, NewUser, RegisterUser, Role,
    TokenResponse, User, UserResponse,
};
