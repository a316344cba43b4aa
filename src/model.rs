use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserModel {
    pub id: i64,          //Integer primary key autoincrement
    pub username: String, //Varchar(50) unique
    pub email: String,    //Varchar(120) unique
    pub password: String, //Varchar(100) salted hash
}

#[derive(Debug)]
pub struct UserModelCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct ReviewModel {
    pub id: i64,
    pub movie: String, //Varchar(100)
    pub rating: i64,
    pub comment: String,
    pub username: String, //copied from the owner at creation
    pub user_id: i64,
}

#[derive(Debug)]
pub struct ReviewModelCreate {
    pub movie: String,
    pub rating: i64,
    pub comment: String,
    pub username: String,
    pub user_id: i64,
}

// Form bodies. Every field is optional so a missing one turns into a
// validation message instead of a rejected request.

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct RegisterPost {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub csrf_token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct LoginPost {
    pub username: Option<String>,
    pub password: Option<String>,
    pub csrf_token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct ReviewPost {
    pub movie: Option<String>,
    pub rating: Option<String>,
    pub comment: Option<String>,
    pub csrf_token: Option<String>,
}
