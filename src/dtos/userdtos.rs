use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::businessdb::{BusinessProfileChanges, NewBusinessProfile};
use crate::models::{businessmodel::BusinessProfile, ordermodel::OrderStats, usermodel::*};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    pub account_type: Option<AccountType>,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: Option<String>,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 8, message = "Password must be at least 8 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: Option<String>,

    #[validate(custom = "validate_phone_number")]
    pub phone_number: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Profile picture must be a URL"))]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AccountTypeUpdateDto {
    pub account_type: AccountType,
}

/// Kenyan numbers in international form, e.g. 254712345678.
fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let phone_regex = regex::Regex::new(r"^\+?254[17][0-9]{8}$")
        .map_err(|_| ValidationError::new("invalid_phone_regex"))?;

    if !phone_regex.is_match(phone) {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some(Cow::from(
            "Phone number must be in the format 2547XXXXXXXX or 2541XXXXXXXX",
        ));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub account_type: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            full_name: user.full_name(),
            account_type: user.account_type.to_str().to_string(),
            phone_number: user.phone_number.clone(),
            bio: user.bio.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

/// Public view of another user.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUserDto {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub account_type: AccountType,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<&User> for PublicUserDto {
    fn from(user: &User) -> Self {
        PublicUserDto {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            account_type: user.account_type,
            bio: user.bio.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardDto {
    pub account_type: AccountType,
    pub stats: OrderStats,
    pub services_count: Option<usize>,
    pub unread_notifications: i64,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateBusinessProfileDto {
    #[validate(length(min = 1, max = 200, message = "Business name is required"))]
    pub business_name: String,

    #[validate(length(min = 1, max = 100, message = "Business type is required"))]
    pub business_type: String,

    #[validate(length(max = 100, message = "Registration number is too long"))]
    pub registration_number: Option<String>,

    #[validate(length(max = 100, message = "Tax ID is too long"))]
    pub tax_id: Option<String>,

    #[validate(length(min = 1, message = "Business address is required"))]
    pub business_address: String,

    #[validate(length(min = 1, max = 15, message = "Business phone must be at most 15 characters"))]
    pub business_phone: String,

    #[validate(url(message = "Website must be a URL"))]
    pub website: Option<String>,

    #[serde(default)]
    pub description: String,

    #[validate(url(message = "Logo must be a URL"))]
    pub logo: Option<String>,
}

impl From<CreateBusinessProfileDto> for NewBusinessProfile {
    fn from(dto: CreateBusinessProfileDto) -> Self {
        NewBusinessProfile {
            business_name: dto.business_name,
            business_type: dto.business_type,
            registration_number: dto.registration_number,
            tax_id: dto.tax_id,
            business_address: dto.business_address,
            business_phone: dto.business_phone,
            website: dto.website,
            description: dto.description,
            logo: dto.logo,
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateBusinessProfileDto {
    #[validate(length(min = 1, max = 200, message = "Business name cannot be empty"))]
    pub business_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Business type cannot be empty"))]
    pub business_type: Option<String>,
    #[validate(length(max = 100, message = "Registration number is too long"))]
    pub registration_number: Option<String>,
    #[validate(length(max = 100, message = "Tax ID is too long"))]
    pub tax_id: Option<String>,
    #[validate(length(min = 1, message = "Business address cannot be empty"))]
    pub business_address: Option<String>,
    #[validate(length(min = 1, max = 15, message = "Business phone must be at most 15 characters"))]
    pub business_phone: Option<String>,
    #[validate(url(message = "Website must be a URL"))]
    pub website: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Logo must be a URL"))]
    pub logo: Option<String>,
}

impl From<UpdateBusinessProfileDto> for BusinessProfileChanges {
    fn from(dto: UpdateBusinessProfileDto) -> Self {
        BusinessProfileChanges {
            business_name: dto.business_name,
            business_type: dto.business_type,
            registration_number: dto.registration_number,
            tax_id: dto.tax_id,
            business_address: dto.business_address,
            business_phone: dto.business_phone,
            website: dto.website,
            description: dto.description,
            logo: dto.logo,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BusinessProfileDto {
    #[serde(flatten)]
    pub profile: BusinessProfile,
    pub user_name: String,
    pub user_email: String,
    pub is_verified: bool,
}

impl BusinessProfileDto {
    pub fn new(profile: BusinessProfile, owner: &User) -> Self {
        BusinessProfileDto {
            is_verified: profile.is_verified(),
            profile,
            user_name: owner.full_name(),
            user_email: owner.email.clone(),
        }
    }
}
