use rocket::Route;

mod admin;
mod results;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(results::routes());
    routes.extend(voter::routes());
    routes
}
