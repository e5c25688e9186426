use routegen::{Form, JsonResponse};

#[derive(Default)]
pub struct Counter {
    total: i64,
}

impl Counter {
    //routegen:api POST /count
    pub fn bump(&mut self, by: Form<i64>) -> JsonResponse<i64> {
        self.total += by.value;
        JsonResponse::ok(self.total)
    }

    pub fn total(&self) -> i64 {
        self.total
    }
}
