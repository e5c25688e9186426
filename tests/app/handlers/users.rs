use std::sync::Mutex;

use routegen::{Form, Header, JsonResponse, Path, Query};

#[derive(Default)]
pub struct UserController {
    names: Mutex<Vec<String>>,
}

impl UserController {
    //routegen:api POST /users
    pub fn create(&self, name: &Form<String>, role: Query<String>) -> JsonResponse<String> {
        let mut names = self.names.lock().unwrap();
        names.push(name.value.clone());
        JsonResponse::ok(format!("{} as {} is #{}", name.value, role.value, names.len()))
    }

    //routegen:api GET /users/:id
    pub fn get(&self, id: Path<i64>, x_trace: Header<String>) -> JsonResponse<String> {
        JsonResponse::ok(format!("user {} traced by {}", id.value, x_trace.value))
    }
}
